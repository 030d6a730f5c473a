//! Tracing subscriber initialisation

use mishkat_domain::LoggingSettings;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber described by `settings`.
///
/// `RUST_LOG` takes precedence over `settings.filter`. Returns `false` when a
/// subscriber was already installed, in which case nothing changes.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if settings.json {
        builder.json().with_current_span(false).try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(filter = %settings.filter, json = settings.json, "Tracing initialised");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_initialisation_is_a_no_op() {
        let settings = LoggingSettings::default();
        init_tracing(&settings);
        assert!(!init_tracing(&settings));
    }
}
