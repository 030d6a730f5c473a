//! Batcher configuration

use std::time::Duration;

use crate::error::CommonError;

/// Configuration of a [`RequestBatcher`](super::RequestBatcher)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Quiet period after the last arrival before a batch runs
    pub delay: Duration,

    /// Deliver each member's own outcome instead of failing the whole batch
    /// when one member fails
    pub isolate_failures: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { delay: Duration::from_millis(50), isolate_failures: false }
    }
}

impl BatchConfig {
    /// Debounce window of `delay`, all-or-nothing failures
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Self::default() }
    }

    /// Switch to independent per-member outcomes
    #[must_use]
    pub fn isolated(mut self) -> Self {
        self.isolate_failures = true;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), CommonError> {
        if self.delay.is_zero() {
            return Err(CommonError::config_field("delay", "batch delay must be greater than zero"));
        }
        Ok(())
    }
}
