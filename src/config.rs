//! Runtime configuration for the orchestration core.
//!
//! Loaded from TOML with per-field defaults, so a missing file or a
//! partial file both work. Validation is pure and runs once at load.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Completion-service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleterConfig {
    /// Hard per-call timeout in seconds.
    #[serde(default = "default_completer_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether to retry once on transport failure.
    #[serde(default = "default_true")]
    pub retry: bool,

    /// Backoff before the retry, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl CompleterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for CompleterConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_completer_timeout_secs(),
            retry: default_true(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Background-runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Maximum concurrently running synthesis jobs.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Completed jobs retained for status queries.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            history_limit: default_history_limit(),
        }
    }
}

/// Periodic-scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Window for escalating unassigned high-priority risks, in days.
    #[serde(default = "default_escalation_window_days")]
    pub escalation_window_days: i64,

    /// Age after which an under-review compliance item is stale, in days.
    #[serde(default = "default_stale_compliance_days")]
    pub stale_compliance_days: i64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            escalation_window_days: default_escalation_window_days(),
            stale_compliance_days: default_stale_compliance_days(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskmapConfig {
    #[serde(default)]
    pub completer: CompleterConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

impl RiskmapConfig {
    /// Load from a TOML file, falling back to defaults when the file is
    /// absent or unparseable.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => {
                log::debug!("no config at {}, using defaults", path.display());
                return Self::default();
            }
        };
        match toml::from_str::<Self>(&raw) {
            Ok(config) => match config.validate() {
                Ok(()) => {
                    log::debug!("loaded config from {}", path.display());
                    config
                }
                Err(reason) => {
                    log::warn!(
                        "config at {} is invalid ({}), using defaults",
                        path.display(),
                        reason
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "failed to parse config at {} ({}), using defaults",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), String> {
        Self::require_positive(self.completer.timeout_secs as i64, "completer.timeout_secs")?;
        Self::require_positive(self.runner.max_workers as i64, "runner.max_workers")?;
        Self::require_positive(self.runner.history_limit as i64, "runner.history_limit")?;
        Self::require_positive(
            self.scanner.escalation_window_days,
            "scanner.escalation_window_days",
        )?;
        Self::require_positive(
            self.scanner.stale_compliance_days,
            "scanner.stale_compliance_days",
        )?;
        Ok(())
    }

    // Pure function: positive-value check with field name
    fn require_positive(value: i64, name: &str) -> Result<(), String> {
        if value > 0 {
            Ok(())
        } else {
            Err(format!("{} must be positive", name))
        }
    }
}

fn default_completer_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_retry_backoff_ms() -> u64 {
    200
}

fn default_max_workers() -> usize {
    num_cpus::get()
}

fn default_history_limit() -> usize {
    100
}

fn default_escalation_window_days() -> i64 {
    7
}

fn default_stale_compliance_days() -> i64 {
    90
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RiskmapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.completer.timeout_secs, 30);
        assert_eq!(config.runner.history_limit, 100);
        assert_eq!(config.scanner.escalation_window_days, 7);
        assert_eq!(config.scanner.stale_compliance_days, 90);
        assert!(config.runner.max_workers >= 1);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RiskmapConfig = toml::from_str(
            r#"
            [completer]
            timeout_secs = 5
        "#,
        )
        .unwrap();
        assert_eq!(config.completer.timeout_secs, 5);
        assert!(config.completer.retry);
        assert_eq!(config.runner.history_limit, 100);
    }

    #[test]
    fn test_zero_history_limit_is_invalid() {
        let config: RiskmapConfig = toml::from_str(
            r#"
            [runner]
            history_limit = 0
        "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("history_limit"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = RiskmapConfig::load(Path::new("/nonexistent/riskmap.toml"));
        assert_eq!(config.completer.timeout_secs, 30);
    }
}
