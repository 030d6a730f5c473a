//! Testing utilities and helpers
//!
//! - **[`async_utils`]**: polling helpers and `assert_eventually_async!`
//! - **[`mocks`]**: failure-injecting storage and call counters
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "runtime")]
//! # {
//! use mishkat_common::testing::{CallCounter, MockClock};
//!
//! let clock = MockClock::new();
//! clock.advance(std::time::Duration::from_secs(5));
//!
//! let origin_calls = CallCounter::new();
//! origin_calls.hit();
//! assert_eq!(origin_calls.count(), 1);
//! # }
//! ```

pub mod async_utils;
pub mod mocks;

pub use async_utils::{poll_until, timeout_ok};
pub use mocks::{CallCounter, FlakyKeyValueStore};

pub use crate::storage::{MemoryKeyValueStore, MemoryRowStore};
pub use crate::time::{Clock, MockClock, SystemClock};
