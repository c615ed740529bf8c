//! Gate configuration and loading
//!
//! All knobs are overridable through a TOML file at process start and default
//! to values suitable for an interactive client. Zero values are rejected at
//! load time: a zero-capacity queue or a zero sweep interval silently disables
//! the subsystem, which is never what the operator meant.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Configuration for the refresh gate, immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Hard capacity of the waiting queue; enqueue past this rejects.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
    /// How long a queued caller may wait before the sweep rejects it.
    #[serde(default = "default_queue_timeout_ms")]
    pub queue_timeout_ms: u64,
    /// Consecutive renewal failures tolerated before the session expires.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Period of the background timeout sweep.
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,
}

fn default_max_queue_size() -> usize {
    50
}

fn default_queue_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_cleanup_interval_ms() -> u64 {
    60_000
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_queue_size: default_max_queue_size(),
            queue_timeout_ms: default_queue_timeout_ms(),
            max_retries: default_max_retries(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
        }
    }
}

impl GateConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: GateConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would disable the gate.
    pub fn validate(&self) -> common::Result<()> {
        if self.max_queue_size == 0 {
            return Err(common::Error::Config(
                "max_queue_size must be greater than 0".into(),
            ));
        }
        if self.queue_timeout_ms == 0 {
            return Err(common::Error::Config(
                "queue_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.cleanup_interval_ms == 0 {
            return Err(common::Error::Config(
                "cleanup_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Queue timeout as a `Duration`.
    pub fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }

    /// Sweep period as a `Duration`.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GateConfig::default();
        assert_eq!(config.max_queue_size, 50);
        assert_eq!(config.queue_timeout_ms, 30_000);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.cleanup_interval_ms, 60_000);
        config.validate().unwrap();
    }

    #[test]
    fn load_valid_file_with_partial_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(
            &path,
            r#"
max_queue_size = 10
queue_timeout_ms = 5000
"#,
        )
        .unwrap();

        let config = GateConfig::load(&path).unwrap();
        assert_eq!(config.max_queue_size, 10);
        assert_eq!(config.queue_timeout_ms, 5000);
        // unspecified fields keep their defaults
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.cleanup_interval_ms, 60_000);
    }

    #[test]
    fn load_missing_file_errors() {
        let result = GateConfig::load(Path::new("/nonexistent/gate.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_invalid_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(&path, "not valid {{{{ toml").unwrap();
        assert!(GateConfig::load(&path).is_err());
    }

    #[test]
    fn zero_queue_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(&path, "max_queue_size = 0").unwrap();

        let err = GateConfig::load(&path).unwrap_err();
        assert!(
            err.to_string().contains("max_queue_size"),
            "error should name the offending field, got: {err}"
        );
    }

    #[test]
    fn zero_queue_timeout_rejected() {
        let config = GateConfig {
            queue_timeout_ms: 0,
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_cleanup_interval_rejected() {
        let config = GateConfig {
            cleanup_interval_ms: 0,
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_retries_is_allowed() {
        // max_retries = 0 means "expire the session on the first 401 without
        // ever calling the renewal endpoint"; unusual but coherent.
        let config = GateConfig {
            max_retries: 0,
            ..GateConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn duration_accessors_convert_milliseconds() {
        let config = GateConfig {
            queue_timeout_ms: 1500,
            cleanup_interval_ms: 250,
            ..GateConfig::default()
        };
        assert_eq!(config.queue_timeout(), Duration::from_millis(1500));
        assert_eq!(config.cleanup_interval(), Duration::from_millis(250));
    }
}
