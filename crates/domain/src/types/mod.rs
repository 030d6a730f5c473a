//! Content types delivered by the origin APIs and cached by the
//! orchestration layer
//!
//! All types serialize to the JSON shape stored in the cache tiers, so a
//! value written by one release can be read back by the next.

pub mod dua;
pub mod hadith;
pub mod quran;
pub mod translation;

pub use dua::Dua;
pub use hadith::{Hadith, HadithGrade, HadithPage};
pub use quran::{RevelationPlace, Surah, Verse, VerseRef};
pub use translation::{TranslationRecord, TranslationRequest};
