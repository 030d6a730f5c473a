//! Machine translation requests and the shared translation cache rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{MishkatError, Result};

/// Text to translate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    /// BCP 47 language tag (`en`, `ur`, `id`)
    pub target_language: String,
}

impl TranslationRequest {
    /// Build a request, rejecting empty text or language.
    ///
    /// # Errors
    /// Returns `MishkatError::InvalidInput` for empty fields.
    pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let target_language = target_language.into().trim().to_lowercase();
        if text.trim().is_empty() {
            return Err(MishkatError::InvalidInput("text to translate is empty".into()));
        }
        if target_language.is_empty() {
            return Err(MishkatError::InvalidInput("target language is empty".into()));
        }
        Ok(Self { text, target_language })
    }
}

/// Row of the remote `translation_cache` table, unique on
/// `(text_hash, target_language)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub text_hash: String,
    pub target_language: String,
    pub source_text: String,
    pub translated_text: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_normalizes_language() {
        let request = TranslationRequest::new("بسم الله", " EN ").unwrap();
        assert_eq!(request.target_language, "en");
        assert!(TranslationRequest::new("  ", "en").is_err());
        assert!(TranslationRequest::new("text", "").is_err());
    }
}
