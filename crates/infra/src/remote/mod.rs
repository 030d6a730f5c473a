//! Remote row store reached over HTTP

pub mod rest_row_store;

pub use rest_row_store::RestRowStore;
