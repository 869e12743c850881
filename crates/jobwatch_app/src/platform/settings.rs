//! Settings file for the jobwatch binary.
//!
//! Read from a RON file; every field is optional and falls back to its default.

use std::fs;
use std::path::Path;
use std::time::Duration;

use jobwatch_core::{ErrorMarker, LimitBounds, DEFAULT_ERROR_MARKER};
use jobwatch_engine::{MonitorSettings, ServiceSettings};
use jobwatch_logging::watch_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: ron::error::SpannedError,
    },
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub error_marker: String,
    pub limit_min: u32,
    pub limit_max: u32,
    pub preview_rows: usize,
    pub log_to_file: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            poll_interval_ms: 1000,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            error_marker: DEFAULT_ERROR_MARKER.to_string(),
            limit_min: 20,
            limit_max: 1000,
            preview_rows: 10,
            log_to_file: false,
        }
    }
}

impl AppSettings {
    /// Loads settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let settings: Self = ron::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        watch_info!("Loaded settings from {:?}", path);
        settings.validate()
    }

    pub fn with_overrides(mut self, base_url: Option<String>, interval_ms: Option<u64>) -> Result<Self, SettingsError> {
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if let Some(interval_ms) = interval_ms {
            self.poll_interval_ms = interval_ms;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, SettingsError> {
        if self.poll_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.limit_min == 0 || self.limit_min > self.limit_max {
            return Err(SettingsError::Invalid(format!(
                "limit range {}..={} is empty or starts at zero",
                self.limit_min, self.limit_max
            )));
        }
        Ok(self)
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            limit_bounds: LimitBounds {
                min: self.limit_min,
                max: self.limit_max,
            },
            error_marker: ErrorMarker::new(self.error_marker.clone()),
            preview_rows: self.preview_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = AppSettings::load(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jobwatch.ron");
        fs::write(
            &path,
            "(base_url: \"http://10.0.0.5:5000\", poll_interval_ms: 2000, error_marker: \"FAILED\")",
        )
        .unwrap();

        let settings = AppSettings::load(&path).unwrap();
        assert_eq!(settings.base_url, "http://10.0.0.5:5000");
        assert_eq!(settings.poll_interval_ms, 2000);
        assert_eq!(settings.limit_max, 1000);

        let monitor = settings.monitor_settings();
        assert_eq!(monitor.poll_interval, Duration::from_millis(2000));
        assert_eq!(monitor.error_marker, ErrorMarker::new("FAILED"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jobwatch.ron");
        fs::write(&path, "(base_url: 42").unwrap();

        assert!(matches!(
            AppSettings::load(&path),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = AppSettings::default()
            .with_overrides(None, Some(0))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn inverted_limit_range_is_rejected() {
        let settings = AppSettings {
            limit_min: 500,
            limit_max: 100,
            ..AppSettings::default()
        };
        assert!(settings.with_overrides(None, None).is_err());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let settings = AppSettings::default()
            .with_overrides(Some("http://example.test".to_string()), Some(250))
            .unwrap();
        assert_eq!(settings.service_settings().base_url, "http://example.test");
        assert_eq!(settings.poll_interval_ms, 250);
    }
}
