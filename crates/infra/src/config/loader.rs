//! Configuration loader
//!
//! Loads application configuration from a file and environment variables.
//!
//! ## Loading Strategy
//! 1. Probes for a configuration file (`config.toml`, `cartable.toml`,
//!    `config.json`, `cartable.json` in the working directory, then the
//!    parent directory); falls back to defaults when none is found.
//! 2. Applies `CARTABLE_*` environment variable overrides on top.
//! 3. Validates the result.
//!
//! ## Environment Variables
//! - `CARTABLE_POLL_INTERVAL_SECS`: seconds between cycles
//! - `CARTABLE_CYCLE_TIMEOUT_SECS`: whole-cycle timeout
//! - `CARTABLE_RATE_LIMIT_MAX_REQUESTS`: requests per window
//! - `CARTABLE_RATE_LIMIT_WINDOW_SECS`: rate-limit window
//! - `CARTABLE_RATE_LIMIT_MAX_WAIT_SECS`: bounded wait for a slot
//! - `CARTABLE_RETRY_MAX_ATTEMPTS`: attempts per operation
//! - `CARTABLE_RETRY_BASE_DELAY_MS`: backoff base delay
//! - `CARTABLE_RETRY_MAX_DELAY_MS`: backoff delay cap
//! - `CARTABLE_RETRY_JITTER_RATIO`: proportional jitter in [0, 1]
//! - `CARTABLE_BREAKER_FAILURE_THRESHOLD`: failures before opening
//! - `CARTABLE_BREAKER_COOLDOWN_SECS`: cooldown before a probe
//! - `CARTABLE_SESSION_FRESHNESS_SECS`: session reuse window
//! - `CARTABLE_MAX_TRACKED_PERIODS`: periods tracked per cycle
//! - `CARTABLE_GRADES_DISPLAY_LIMIT`: grades surfaced per period

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cartable_domain::{CartableConfig, ConfigError};
use tracing::{debug, info};

const PROBE_NAMES: [&str; 4] = ["config.toml", "cartable.toml", "config.json", "cartable.json"];

/// Load configuration with the file-then-environment strategy.
///
/// # Errors
/// Returns `ConfigError` if a found file cannot be parsed, an environment
/// override has an invalid value, or the merged configuration fails
/// validation.
pub fn load() -> Result<CartableConfig, ConfigError> {
    let mut config = match find_config_file() {
        Some(path) => {
            info!(path = %path.display(), "loading configuration file");
            load_from_file(&path)?
        }
        None => {
            debug!("no configuration file found, starting from defaults");
            CartableConfig::default()
        }
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific file (TOML or JSON by extension).
pub fn load_from_file(path: &Path) -> Result<CartableConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::NotFound(format!("{}: {e}", path.display())))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string())),
        Some("json") => serde_json::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string())),
        other => Err(ConfigError::Parse(format!(
            "unsupported configuration format: {}",
            other.unwrap_or("none")
        ))),
    }
}

/// Apply `CARTABLE_*` environment overrides onto `config`.
pub fn apply_env_overrides(config: &mut CartableConfig) -> Result<(), ConfigError> {
    override_from_env(&mut config.poll.interval_secs, "CARTABLE_POLL_INTERVAL_SECS")?;
    override_from_env(&mut config.poll.cycle_timeout_secs, "CARTABLE_CYCLE_TIMEOUT_SECS")?;
    override_from_env(&mut config.rate_limit.max_requests, "CARTABLE_RATE_LIMIT_MAX_REQUESTS")?;
    override_from_env(&mut config.rate_limit.window_secs, "CARTABLE_RATE_LIMIT_WINDOW_SECS")?;
    override_from_env(&mut config.rate_limit.max_wait_secs, "CARTABLE_RATE_LIMIT_MAX_WAIT_SECS")?;
    override_from_env(&mut config.retry.max_attempts, "CARTABLE_RETRY_MAX_ATTEMPTS")?;
    override_from_env(&mut config.retry.base_delay_ms, "CARTABLE_RETRY_BASE_DELAY_MS")?;
    override_from_env(&mut config.retry.max_delay_ms, "CARTABLE_RETRY_MAX_DELAY_MS")?;
    override_from_env(&mut config.retry.jitter_ratio, "CARTABLE_RETRY_JITTER_RATIO")?;
    override_from_env(
        &mut config.circuit_breaker.failure_threshold,
        "CARTABLE_BREAKER_FAILURE_THRESHOLD",
    )?;
    override_from_env(&mut config.circuit_breaker.cooldown_secs, "CARTABLE_BREAKER_COOLDOWN_SECS")?;
    override_from_env(&mut config.session.freshness_secs, "CARTABLE_SESSION_FRESHNESS_SECS")?;
    override_from_env(&mut config.tracking.max_tracked_periods, "CARTABLE_MAX_TRACKED_PERIODS")?;
    override_from_env(
        &mut config.tracking.grades_display_limit,
        "CARTABLE_GRADES_DISPLAY_LIMIT",
    )?;
    Ok(())
}

fn find_config_file() -> Option<PathBuf> {
    for dir in [Path::new("."), Path::new("..")] {
        for name in PROBE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

fn override_from_env<T>(slot: &mut T, name: &str) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    if let Ok(value) = std::env::var(name) {
        *slot = value
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("{name} has an invalid value: {e}")))?;
        debug!(var = name, "applied environment override");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[poll]\ninterval_secs = 120\n\n[circuit_breaker]\nfailure_threshold = 7\n"
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.poll.interval_secs, 120);
        assert_eq!(config.circuit_breaker.failure_threshold, 7);
        // Untouched sections fall back to defaults
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn loads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"session": {"freshness_secs": 42}}"#).unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.session.freshness_secs, 42);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "poll:\n  interval_secs: 5\n").unwrap();

        assert!(matches!(load_from_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_reports_not_found() {
        let path = Path::new("/nonexistent/cartable/config.toml");
        assert!(matches!(load_from_file(path), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn env_override_applies_on_top_of_defaults() {
        std::env::set_var("CARTABLE_BREAKER_FAILURE_THRESHOLD", "9");
        let mut config = CartableConfig::default();
        apply_env_overrides(&mut config).unwrap();
        std::env::remove_var("CARTABLE_BREAKER_FAILURE_THRESHOLD");

        assert_eq!(config.circuit_breaker.failure_threshold, 9);
    }

    #[test]
    fn invalid_env_value_is_rejected() {
        std::env::set_var("CARTABLE_RETRY_JITTER_RATIO", "not-a-number");
        let mut config = CartableConfig::default();
        let result = apply_env_overrides(&mut config);
        std::env::remove_var("CARTABLE_RETRY_JITTER_RATIO");

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
