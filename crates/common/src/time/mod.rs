//! Time sources
//!
//! See [`clock`] for the [`Clock`] abstraction used across the runtime tier.

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
