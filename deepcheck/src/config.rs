//! Configuration types and defaults

use crate::{CaptureConstraints, DeepCheckError};
use deepcheck_core::{ANALYZE_PATH, VERIFY_PATH};
use deepcheck_media::{DEFAULT_JPEG_QUALITY, METADATA_TIMEOUT};
use std::time::Duration;

/// Default analysis backend
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Global DeepCheck configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalConfig {
    /// Analysis backend base URL
    pub api_base_url: String,
    /// Still-image analysis path
    pub analyze_path: String,
    /// Media verification path
    pub verify_path: String,
    /// Per-request bound; `None` leaves analysis calls unbounded
    pub request_timeout: Option<Duration>,
    /// Enable debug logging
    pub debug_logging: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            analyze_path: ANALYZE_PATH.to_string(),
            verify_path: VERIFY_PATH.to_string(),
            request_timeout: None,
            debug_logging: false,
        }
    }
}

impl GlobalConfig {
    /// Defaults overridden by `DEEPCHECK_*` environment variables
    ///
    /// Recognised: `DEEPCHECK_API_URL`, `DEEPCHECK_ANALYZE_PATH`,
    /// `DEEPCHECK_VERIFY_PATH`, `DEEPCHECK_REQUEST_TIMEOUT_SECS`,
    /// `DEEPCHECK_DEBUG`.
    pub fn from_env() -> Result<Self, DeepCheckError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GlobalConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DeepCheckError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DEEPCHECK_API_URL") {
            config.api_base_url = url;
        }
        if let Some(path) = lookup("DEEPCHECK_ANALYZE_PATH") {
            config.analyze_path = path;
        }
        if let Some(path) = lookup("DEEPCHECK_VERIFY_PATH") {
            config.verify_path = path;
        }
        if let Some(secs) = lookup("DEEPCHECK_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| DeepCheckError::Configuration {
                message: format!("DEEPCHECK_REQUEST_TIMEOUT_SECS is not a number: {secs}"),
            })?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(flag) = lookup("DEEPCHECK_DEBUG") {
            config.debug_logging = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(config)
    }
}

/// Capture controller configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Camera constraints used for every acquisition
    pub constraints: CaptureConstraints,
    /// Bound on the video metadata wait
    pub metadata_timeout: Duration,
    /// JPEG quality for captured frames (1-100)
    pub jpeg_quality: u8,
    /// Capacity of the controller event channel
    pub event_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            constraints: CaptureConstraints::default(),
            metadata_timeout: METADATA_TIMEOUT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            event_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = GlobalConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.analyze_path, "/api/analyze");
        assert_eq!(config.verify_path, "/api/verify");
        assert!(config.request_timeout.is_none());

        let controller = ControllerConfig::default();
        assert_eq!(controller.metadata_timeout, Duration::from_secs(10));
        assert_eq!(controller.jpeg_quality, 80);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DEEPCHECK_API_URL", "https://detector.example"),
            ("DEEPCHECK_REQUEST_TIMEOUT_SECS", "30"),
            ("DEEPCHECK_DEBUG", "true"),
        ]
        .into_iter()
        .collect();

        let config = GlobalConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api_base_url, "https://detector.example");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert!(config.debug_logging);
        assert_eq!(config.verify_path, "/api/verify");
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let result = GlobalConfig::from_lookup(|key| {
            (key == "DEEPCHECK_REQUEST_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(result.is_err());

        let config = GlobalConfig::from_lookup(|key| {
            (key == "DEEPCHECK_REQUEST_TIMEOUT_SECS").then(|| "0".to_string())
        })
        .unwrap();
        assert!(config.request_timeout.is_none());
    }
}
