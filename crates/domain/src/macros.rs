//! Display/FromStr for label enums
//!
//! Content enums travel as lowercase labels in API payloads, cache keys and
//! row-store columns. This macro keeps both directions in one mapping.
//!
//! # Example
//!
//! ```rust
//! use mishkat_domain::impl_label_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Script {
//!     Uthmani,
//!     Indopak,
//! }
//!
//! impl_label_conversions!(Script {
//!     Uthmani => "uthmani",
//!     Indopak => "indopak",
//! });
//!
//! assert_eq!(Script::Indopak.to_string(), "indopak");
//! assert_eq!("UTHMANI".parse::<Script>(), Ok(Script::Uthmani));
//! ```

/// Implements `Display` and case-insensitive `FromStr` for a label enum.
#[macro_export]
macro_rules! impl_label_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::MishkatError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err($crate::MishkatError::InvalidInput(format!(
                        "Invalid {}: {}",
                        stringify!($enum_name),
                        s
                    ))),
                }
            }
        }
    };
}
