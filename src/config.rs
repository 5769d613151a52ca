//! Configuration for the tracker.
//!
//! Two configuration sources exist:
//!
//! - [`TrackerConfig`]: local settings parsed from environment variables at
//!   startup.
//! - [`RemoteConfig`]: the feature-flag document fetched from the site at
//!   startup, deciding whether tag forwarding activates.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `FOLIO_CONFIG_URL` | No | - | Remote config URL (forwarding stays off if unset) |
//! | `FOLIO_DATA_DIR` | No | `~/.folio-analytics` | Directory holding the store file |
//! | `FOLIO_TAG_ORIGIN` | No | gtag script origin | Tag script URL, parameterized by measurement id |
//! | `FOLIO_TAG_QUEUE_SIZE` | No | 1000 | Tag command queue capacity |

use std::env;
use std::path::PathBuf;

use directories::BaseDirs;
use reqwest::header::CACHE_CONTROL;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Default data directory name relative to home.
const DEFAULT_DATA_DIR: &str = ".folio-analytics";

/// Default tag script origin.
pub const DEFAULT_TAG_ORIGIN: &str = "https://www.googletagmanager.com/gtag/js";

/// Default tag command queue capacity.
const DEFAULT_TAG_QUEUE_SIZE: usize = 1000;

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Local configuration for the tracker.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// URL of the remote feature-flag config. `None` disables forwarding
    /// outright.
    pub config_url: Option<String>,

    /// Directory holding the persistent store file.
    pub data_dir: PathBuf,

    /// Tag script origin, parameterized by measurement id on load.
    pub tag_origin: String,

    /// Capacity of the tag command queue.
    pub tag_queue_size: usize,
}

impl TrackerConfig {
    /// Creates a `TrackerConfig` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `FOLIO_TAG_QUEUE_SIZE` is set but is not
    /// a positive integer, or the home directory cannot be determined while
    /// `FOLIO_DATA_DIR` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_url = env::var("FOLIO_CONFIG_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let data_dir = match env::var("FOLIO_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => {
                let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
                base_dirs.home_dir().join(DEFAULT_DATA_DIR)
            }
        };

        let tag_origin =
            env::var("FOLIO_TAG_ORIGIN").unwrap_or_else(|_| DEFAULT_TAG_ORIGIN.to_string());

        let tag_queue_size = match env::var("FOLIO_TAG_QUEUE_SIZE") {
            Ok(val) => {
                let size = val
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "FOLIO_TAG_QUEUE_SIZE".to_string(),
                        message: format!("expected positive integer, got '{val}'"),
                    })?;
                if size == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "FOLIO_TAG_QUEUE_SIZE".to_string(),
                        message: "queue size must be greater than 0".to_string(),
                    });
                }
                size
            }
            Err(_) => DEFAULT_TAG_QUEUE_SIZE,
        };

        Ok(Self {
            config_url,
            data_dir,
            tag_origin,
            tag_queue_size,
        })
    }

    /// Path of the store file inside the data directory.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("analytics.json")
    }
}

/// Remote feature-flag configuration.
///
/// Fetched once at startup. Forwarding activates only when `enabled` is
/// true and a non-empty measurement id is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteConfig {
    /// Master switch for tag forwarding.
    pub enabled: bool,

    /// Tag measurement id (e.g. `G-XXXXXXXXXX`).
    pub measurement_id: Option<String>,
}

impl RemoteConfig {
    /// Fetches the remote config from `url` with caching disabled.
    ///
    /// Any failure — network error, non-2xx status, malformed JSON — is
    /// logged and yields `None`. A missing remote config is an expected
    /// state, never an error.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Option<Self> {
        let response = client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => match res.json::<Self>().await {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!(error = %e, "Remote config is malformed, forwarding stays off");
                    None
                }
            },
            Ok(res) => {
                warn!(
                    status = res.status().as_u16(),
                    "Remote config fetch failed, forwarding stays off"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, "Remote config fetch failed, forwarding stays off");
                None
            }
        }
    }

    /// Returns the measurement id if forwarding should activate.
    #[must_use]
    pub fn measurement_id_if_enabled(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.measurement_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Runs a test with all FOLIO_* environment variables cleared, then
    /// restores them.
    fn with_clean_env<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let saved_vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with("FOLIO_"))
            .collect();

        for (key, _) in &saved_vars {
            env::remove_var(key);
        }

        let result = f();

        for (key, value) in saved_vars {
            env::set_var(key, value);
        }

        result
    }

    #[test]
    #[serial]
    fn minimal_config_uses_defaults() {
        with_clean_env(|| {
            let config = TrackerConfig::from_env().expect("should parse minimal config");

            assert!(config.config_url.is_none());
            assert!(config.data_dir.ends_with(DEFAULT_DATA_DIR));
            assert_eq!(config.tag_origin, DEFAULT_TAG_ORIGIN);
            assert_eq!(config.tag_queue_size, DEFAULT_TAG_QUEUE_SIZE);
        });
    }

    #[test]
    #[serial]
    fn full_config_from_env() {
        with_clean_env(|| {
            env::set_var("FOLIO_CONFIG_URL", "https://example.dev/data/ga.json");
            env::set_var("FOLIO_DATA_DIR", "/custom/data");
            env::set_var("FOLIO_TAG_ORIGIN", "https://tags.example.dev/gtag/js");
            env::set_var("FOLIO_TAG_QUEUE_SIZE", "50");

            let config = TrackerConfig::from_env().expect("should parse full config");

            assert_eq!(
                config.config_url.as_deref(),
                Some("https://example.dev/data/ga.json")
            );
            assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
            assert_eq!(config.tag_origin, "https://tags.example.dev/gtag/js");
            assert_eq!(config.tag_queue_size, 50);
        });
    }

    #[test]
    #[serial]
    fn blank_config_url_treated_as_unset() {
        with_clean_env(|| {
            env::set_var("FOLIO_CONFIG_URL", "   ");

            let config = TrackerConfig::from_env().expect("should parse config");
            assert!(config.config_url.is_none());
        });
    }

    #[test]
    #[serial]
    fn invalid_queue_size_rejected() {
        with_clean_env(|| {
            env::set_var("FOLIO_TAG_QUEUE_SIZE", "not-a-number");

            let result = TrackerConfig::from_env();
            assert!(matches!(
                result.unwrap_err(),
                ConfigError::InvalidValue { ref key, .. } if key == "FOLIO_TAG_QUEUE_SIZE"
            ));
        });
    }

    #[test]
    #[serial]
    fn zero_queue_size_rejected() {
        with_clean_env(|| {
            env::set_var("FOLIO_TAG_QUEUE_SIZE", "0");

            let result = TrackerConfig::from_env();
            assert!(matches!(
                result.unwrap_err(),
                ConfigError::InvalidValue { ref key, ref message }
                    if key == "FOLIO_TAG_QUEUE_SIZE" && message.contains("greater than 0")
            ));
        });
    }

    #[test]
    #[serial]
    fn store_path_is_inside_data_dir() {
        with_clean_env(|| {
            env::set_var("FOLIO_DATA_DIR", "/custom/data");

            let config = TrackerConfig::from_env().unwrap();
            assert_eq!(
                config.store_path(),
                PathBuf::from("/custom/data/analytics.json")
            );
        });
    }

    #[test]
    fn remote_config_parses_expected_shape() {
        let config: RemoteConfig =
            serde_json::from_str(r#"{"enabled": true, "measurementId": "G-ABC123"}"#).unwrap();

        assert!(config.enabled);
        assert_eq!(config.measurement_id.as_deref(), Some("G-ABC123"));
        assert_eq!(config.measurement_id_if_enabled(), Some("G-ABC123"));
    }

    #[test]
    fn remote_config_disabled_yields_no_id() {
        let config: RemoteConfig =
            serde_json::from_str(r#"{"enabled": false, "measurementId": "G-ABC123"}"#).unwrap();

        assert_eq!(config.measurement_id_if_enabled(), None);
    }

    #[test]
    fn remote_config_enabled_without_id_yields_none() {
        let config: RemoteConfig = serde_json::from_str(r#"{"enabled": true}"#).unwrap();
        assert_eq!(config.measurement_id_if_enabled(), None);

        let config: RemoteConfig =
            serde_json::from_str(r#"{"enabled": true, "measurementId": ""}"#).unwrap();
        assert_eq!(config.measurement_id_if_enabled(), None);
    }

    #[test]
    fn remote_config_defaults_to_disabled() {
        let config: RemoteConfig = serde_json::from_str("{}").unwrap();
        assert!(!config.enabled);
        assert!(config.measurement_id.is_none());
    }
}
