//! # DeepCheck - Camera Capture and Deepfake Analysis
//!
//! DeepCheck acquires a camera (directly, or after negotiating permission
//! with a host page through a relay), captures still frames as JPEG
//! data-URIs and submits them to an external deepfake-analysis backend.
//!
//! ## Key Features
//!
//! - **Permission negotiation**: restricted surfaces ask a host page for
//!   camera permission over a small JSON relay protocol
//! - **Bounded acquisition**: the wait for video metadata never hangs
//! - **Classified failures**: every acquisition failure maps to a distinct
//!   status line, with a permission-page offer where it helps
//! - **Backend client**: normalized `Real` / `Fake` / `Suspicious` verdicts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deepcheck::{DeepCheck, ResultView};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let deepcheck = DeepCheck::init()?;
//!
//!     let controller = deepcheck
//!         .controller(deepcheck::default_camera())
//!         .jpeg_quality(80)
//!         .build()?;
//!
//!     controller.start_camera().await?;
//!     let result = controller.capture_and_analyze().await?;
//!     let view = ResultView::from_result(&result);
//!     println!("{} {} {}", view.icon, view.label_text, view.confidence_text);
//!
//!     controller.stop_camera();
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use deepcheck_core::{
    mime_for_path, AnalysisClient, AnalysisClientBuilder, AnalysisResult, AnalysisService,
    DataUri, DeepCheckError, DeepCheckResult, ImageInfo, Label, MediaInfo, PermissionState,
};

pub use deepcheck_media::{
    default_camera, AcquisitionErrorKind, CameraDevice, CaptureConstraints, CaptureSession,
    ConstraintRange, FacingMode, MediaError, MediaResult, MediaStream, SyntheticBehavior,
    SyntheticCamera, VideoResolution,
};

#[cfg(feature = "native")]
pub use deepcheck_media::NativeCamera;

pub use deepcheck_relay::{
    LocalRelay, PermissionAuthority, PermissionRelay, PermissionStore, PermissionUpdate,
    RelayError, RelayHost, WsRelayClient,
};

// Public API modules
pub mod access;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod logging;
pub mod presentation;

// Re-export main API types
pub use access::CameraAccess;
pub use config::{ControllerConfig, GlobalConfig};
pub use controller::{CaptureController, ControllerBuilder, ControllerState};
pub use error::{ControllerError, ControllerResult, StatusKind, StatusReport};
pub use event::{ControllerEvent, EventStream};
pub use logging::init_logging;
pub use presentation::{LabelStyle, ResultView};

use std::sync::Arc;

/// Main entry point for DeepCheck
#[derive(Debug, Clone)]
pub struct DeepCheck {
    inner: Arc<DeepCheckInner>,
}

#[derive(Debug)]
struct DeepCheckInner {
    client: Arc<AnalysisClient>,
    config: GlobalConfig,
}

impl DeepCheck {
    /// Initialize with defaults overridden by the environment
    ///
    /// # Example
    /// ```rust,no_run
    /// use deepcheck::DeepCheck;
    ///
    /// let deepcheck = DeepCheck::init()?;
    /// # Ok::<(), deepcheck::DeepCheckError>(())
    /// ```
    pub fn init() -> Result<Self, DeepCheckError> {
        Self::init_with(GlobalConfig::from_env()?)
    }

    /// Initialize with custom global configuration
    pub fn init_with(config: GlobalConfig) -> Result<Self, DeepCheckError> {
        if config.debug_logging {
            init_logging(true);
        }

        let client = AnalysisClient::builder(config.api_base_url.clone())
            .analyze_path(config.analyze_path.clone())
            .verify_path(config.verify_path.clone())
            .timeout(config.request_timeout)
            .build()?;
        tracing::debug!(base_url = client.base_url(), "DeepCheck initialized");

        Ok(Self {
            inner: Arc::new(DeepCheckInner {
                client: Arc::new(client),
                config,
            }),
        })
    }

    /// Global configuration in use
    pub fn config(&self) -> &GlobalConfig {
        &self.inner.config
    }

    /// The analysis backend client
    pub fn client(&self) -> &AnalysisClient {
        &self.inner.client
    }

    /// The analysis backend as a shareable service
    pub fn analysis_service(&self) -> Arc<dyn AnalysisService> {
        self.inner.client.clone()
    }

    /// Create a controller builder for the given camera
    ///
    /// # Example
    /// ```rust,no_run
    /// use deepcheck::{CameraAccess, DeepCheck, SyntheticCamera};
    /// use std::sync::Arc;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let deepcheck = DeepCheck::init()?;
    /// let controller = deepcheck
    ///     .controller(Arc::new(SyntheticCamera::new()))
    ///     .access(CameraAccess::Direct)
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn controller(&self, camera: Arc<dyn CameraDevice>) -> ControllerBuilder {
        ControllerBuilder::new(self, camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_custom_backend() {
        let deepcheck = DeepCheck::init_with(GlobalConfig {
            api_base_url: "http://127.0.0.1:8080/".to_string(),
            ..GlobalConfig::default()
        })
        .unwrap();
        assert_eq!(deepcheck.client().base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_init_rejects_bad_url() {
        let result = DeepCheck::init_with(GlobalConfig {
            api_base_url: "localhost".to_string(),
            ..GlobalConfig::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_bad_quality() {
        let deepcheck = DeepCheck::init_with(GlobalConfig::default()).unwrap();
        let result = deepcheck
            .controller(Arc::new(SyntheticCamera::new()))
            .jpeg_quality(0)
            .build();
        assert!(result.is_err());
    }
}
