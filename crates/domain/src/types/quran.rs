//! Quran content

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::SURAH_COUNT;
use crate::errors::{MishkatError, Result};
use crate::impl_label_conversions;

/// Where a surah was revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevelationPlace {
    Meccan,
    Medinan,
}

impl_label_conversions!(RevelationPlace {
    Meccan => "meccan",
    Medinan => "medinan",
});

/// Surah metadata as listed by the Quran API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surah {
    pub number: u16,
    pub name: String,
    pub english_name: String,
    pub english_translation: String,
    pub verse_count: u16,
    pub revelation: RevelationPlace,
}

/// One ayah with optional translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub surah: u16,
    pub ayah: u16,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub juz: Option<u8>,
}

impl Verse {
    pub fn reference(&self) -> VerseRef {
        VerseRef { surah: self.surah, ayah: self.ayah }
    }
}

/// `surah:ayah` address of a verse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseRef {
    pub surah: u16,
    pub ayah: u16,
}

impl VerseRef {
    /// Build a reference, rejecting surahs outside 1..=114 and ayah 0.
    ///
    /// # Errors
    /// Returns `MishkatError::InvalidInput` for out-of-range numbers.
    pub fn new(surah: u16, ayah: u16) -> Result<Self> {
        validate_surah(surah)?;
        if ayah == 0 {
            return Err(MishkatError::InvalidInput(format!("ayah must start at 1 (surah {surah})")));
        }
        Ok(Self { surah, ayah })
    }
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

impl FromStr for VerseRef {
    type Err = MishkatError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MishkatError::InvalidInput(format!("Invalid verse reference: {s}"));
        let (surah, ayah) = s.split_once(':').ok_or_else(invalid)?;
        let surah = surah.trim().parse().map_err(|_| invalid())?;
        let ayah = ayah.trim().parse().map_err(|_| invalid())?;
        Self::new(surah, ayah)
    }
}

/// Check that `surah` names one of the 114 surahs.
///
/// # Errors
/// Returns `MishkatError::InvalidInput` otherwise.
pub fn validate_surah(surah: u16) -> Result<()> {
    if surah == 0 || surah > SURAH_COUNT {
        return Err(MishkatError::InvalidInput(format!(
            "surah must be between 1 and {SURAH_COUNT}, got {surah}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verse_ref_parsing() {
        assert_eq!("2:255".parse::<VerseRef>(), Ok(VerseRef { surah: 2, ayah: 255 }));
        assert_eq!(VerseRef { surah: 36, ayah: 1 }.to_string(), "36:1");
        assert!("115:1".parse::<VerseRef>().is_err());
        assert!("2:0".parse::<VerseRef>().is_err());
        assert!("fatiha".parse::<VerseRef>().is_err());
    }

    #[test]
    fn test_surah_json_shape() {
        let surah = Surah {
            number: 1,
            name: "الفاتحة".into(),
            english_name: "Al-Fatiha".into(),
            english_translation: "The Opening".into(),
            verse_count: 7,
            revelation: RevelationPlace::Meccan,
        };
        let json = serde_json::to_value(&surah).unwrap();
        assert_eq!(json["revelation"], "meccan");
        assert_eq!(serde_json::from_value::<Surah>(json).unwrap(), surah);
    }
}
