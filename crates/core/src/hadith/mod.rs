//! Hadith content, served page by page

pub mod ports;
pub mod service;

pub use ports::HadithApi;
pub use service::HadithService;
