//! Quran content: surah list, verses of a surah and single verses

pub mod ports;
pub mod service;

pub use ports::QuranApi;
pub use service::QuranService;
