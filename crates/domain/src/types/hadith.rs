//! Hadith content

use serde::{Deserialize, Serialize};

use crate::impl_label_conversions;

/// Authenticity grade assigned by the collection's scholars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HadithGrade {
    Sahih,
    Hasan,
    Daif,
    Unknown,
}

impl_label_conversions!(HadithGrade {
    Sahih => "sahih",
    Hasan => "hasan",
    Daif => "daif",
    Unknown => "unknown",
});

/// A single narration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hadith {
    pub collection: String,
    /// Collection numbering, which is not always numeric (`"1a"`)
    pub number: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<HadithGrade>,
}

/// One page of a collection as served by the Hadith API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HadithPage {
    pub collection: String,
    pub page: u32,
    pub hadiths: Vec<Hadith>,
    pub has_next: bool,
}

impl HadithPage {
    /// Page number to prefetch, if there is one
    pub fn next_page(&self) -> Option<u32> {
        self.has_next.then(|| self.page + 1)
    }
}
