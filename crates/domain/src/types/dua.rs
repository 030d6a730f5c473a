//! Supplications stored in the remote `duas` table

use serde::{Deserialize, Serialize};

/// A dua row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dua {
    pub id: i64,
    pub category: String,
    pub title: String,
    pub arabic: String,
    #[serde(default)]
    pub transliteration: Option<String>,
    #[serde(default)]
    pub translation: Option<String>,
    /// Source citation, e.g. `"Bukhari 6306"`
    #[serde(default)]
    pub reference: Option<String>,
}
