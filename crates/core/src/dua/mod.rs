//! Supplications read from the shared row store

pub mod service;

pub use service::DuaService;
