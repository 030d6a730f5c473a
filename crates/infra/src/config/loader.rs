//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Read a `.env` file into the process environment, if one exists
//! 2. Load the file named by `MISHKAT_CONFIG`, if set
//! 3. Otherwise probe the working directory for a config file
//! 4. Otherwise start from [`Config::default`]
//! 5. Apply `MISHKAT_*` overrides, then validate
//!
//! ## Environment Variables
//! - `MISHKAT_CONFIG`: Explicit config file path (`.toml` or `.json`)
//! - `MISHKAT_KV_PATH`: SQLite cache file; `:memory:` keeps it in memory
//! - `MISHKAT_REMOTE_URL`: Base URL of the remote row store
//! - `MISHKAT_REMOTE_API_KEY`: API key for the remote row store
//! - `MISHKAT_LOG_FILTER`: Default tracing filter directive
//! - `MISHKAT_PERF_ENABLED`: Whether performance metrics are recorded
//!
//! ## File Locations
//! Probed in order in the current working directory:
//! `mishkat.toml`, `mishkat.json`, `config.toml`, `config.json`.

use std::path::{Path, PathBuf};

use mishkat_domain::{Config, MishkatError, RemoteSettings, Result};
use tracing::{debug, info};

const CONFIG_PATH_VAR: &str = "MISHKAT_CONFIG";
const KV_PATH_VAR: &str = "MISHKAT_KV_PATH";
const REMOTE_URL_VAR: &str = "MISHKAT_REMOTE_URL";
const REMOTE_API_KEY_VAR: &str = "MISHKAT_REMOTE_API_KEY";
const LOG_FILTER_VAR: &str = "MISHKAT_LOG_FILTER";
const PERF_ENABLED_VAR: &str = "MISHKAT_PERF_ENABLED";

const IN_MEMORY_PATH: &str = ":memory:";
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Load configuration using the full fallback strategy.
///
/// # Errors
/// Returns `MishkatError::Config` if a named or probed file cannot be read
/// or parsed, an override is malformed, or the result fails validation.
pub fn load() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(MishkatError::Config(format!("Invalid .env file: {e}"))),
    }

    let mut config = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => load_from_file(Some(PathBuf::from(path)))?,
        Err(_) => match probe_config_paths() {
            Some(path) => load_from_file(Some(path))?,
            None => {
                info!("No config file found; using defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `MishkatError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MishkatError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MishkatError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MishkatError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration, detecting the format by file extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MishkatError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MishkatError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MishkatError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the current working directory
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    ["mishkat.toml", "mishkat.json", "config.toml", "config.json"]
        .into_iter()
        .map(|name| cwd.join(name))
        .find(|path| path.exists())
}

/// Apply `MISHKAT_*` environment overrides to `config`.
///
/// # Errors
/// Returns `MishkatError::Config` when an API key is given without any
/// remote URL.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(path) = env_opt(KV_PATH_VAR) {
        config.storage.kv_path = (path != IN_MEMORY_PATH).then_some(path);
    }

    if let Some(url) = env_opt(REMOTE_URL_VAR) {
        match config.remote.as_mut() {
            Some(remote) => remote.base_url = url,
            None => {
                config.remote = Some(RemoteSettings {
                    base_url: url,
                    api_key: None,
                    timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
                });
            }
        }
    }

    if let Some(key) = env_opt(REMOTE_API_KEY_VAR) {
        let remote = config.remote.as_mut().ok_or_else(|| {
            MishkatError::Config(format!("{REMOTE_API_KEY_VAR} is set but no remote URL is configured"))
        })?;
        remote.api_key = Some(key);
    }

    if let Some(filter) = env_opt(LOG_FILTER_VAR) {
        config.logging.filter = filter;
    }

    config.performance.enabled = env_bool(PERF_ENABLED_VAR, config.performance.enabled);
    Ok(())
}

/// Non-empty environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
