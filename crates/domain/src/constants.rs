//! Application constants
//!
//! Endpoint names, remote table names and content TTLs shared by the
//! content services and the configuration defaults.

// Rate-limited endpoints
pub const QURAN_API: &str = "quran_api";
pub const HADITH_API: &str = "hadith_api";
pub const TRANSLATION_API: &str = "translation_api";
pub const DATABASE: &str = "database";

// Remote tables
pub const DUAS_TABLE: &str = "duas";
pub const TRANSLATION_CACHE_TABLE: &str = "translation_cache";
pub const TRANSLATION_CONFLICT_COLUMNS: [&str; 2] = ["text_hash", "target_language"];

// Content TTLs (seconds)
pub const SURAH_LIST_TTL_SECS: u64 = 7 * 24 * 3600;
pub const SURAH_VERSES_TTL_SECS: u64 = 7 * 24 * 3600;
pub const HADITH_PAGE_TTL_SECS: u64 = 24 * 3600;
pub const DUA_TTL_SECS: u64 = 24 * 3600;
pub const TRANSLATION_TTL_SECS: u64 = 30 * 24 * 3600;

// Quran bounds
pub const SURAH_COUNT: u16 = 114;
