//! Media error types and the camera acquisition taxonomy
//!
//! Camera backends report failures in very different vocabularies (DOM
//! exception names, OS error strings, driver codes). Everything is folded
//! into [`AcquisitionErrorKind`] so the controller can pick a status message
//! without knowing which backend produced the failure.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a camera could not be acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquisitionErrorKind {
    /// The user or the platform refused camera access
    PermissionDenied,
    /// No camera matching the request exists
    DeviceNotFound,
    /// The camera exists but is held by someone else
    DeviceBusy,
    /// The camera cannot satisfy the requested constraints
    ConstraintsUnsatisfiable,
    /// Access blocked by a security policy (insecure origin, sandbox)
    SecurityBlocked,
    /// The acquisition was aborted before completing
    Aborted,
    /// Anything else
    Other,
}

impl AcquisitionErrorKind {
    /// Classify a DOM exception name as reported by `getUserMedia`
    pub fn from_dom_name(name: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" => Self::DeviceNotFound,
            "NotReadableError" | "TrackStartError" => Self::DeviceBusy,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                Self::ConstraintsUnsatisfiable
            }
            "SecurityError" => Self::SecurityBlocked,
            "AbortError" => Self::Aborted,
            _ => Self::Other,
        }
    }

    /// Best-effort classification of a free-form backend error message
    pub fn from_message(message: &str) -> Self {
        let message = message.to_ascii_lowercase();
        let mentions = |needles: &[&str]| needles.iter().any(|needle| message.contains(*needle));

        if mentions(&["permission", "not allowed", "denied"][..]) {
            Self::PermissionDenied
        } else if mentions(&["busy", "in use", "not readable"][..]) {
            Self::DeviceBusy
        } else if mentions(&["not found", "no device", "no camera"][..]) {
            Self::DeviceNotFound
        } else if mentions(&["format", "resolution", "frame rate", "constraint"][..]) {
            Self::ConstraintsUnsatisfiable
        } else if message.contains("security") {
            Self::SecurityBlocked
        } else if message.contains("abort") {
            Self::Aborted
        } else {
            Self::Other
        }
    }

    /// Human-readable status line for this failure
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Camera access denied. Please allow camera access and try again."
            }
            Self::DeviceNotFound => "No camera found. Please connect a camera and try again.",
            Self::DeviceBusy => "Camera is already in use by another application.",
            Self::ConstraintsUnsatisfiable => "Camera does not support the requested settings.",
            Self::SecurityBlocked => "Camera access blocked for security reasons.",
            Self::Aborted => "Camera access was aborted.",
            Self::Other => "Failed to access camera.",
        }
    }

    /// Whether opening the dedicated permission page could fix this
    pub fn offers_permission_page(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::SecurityBlocked)
    }
}

impl fmt::Display for AcquisitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PermissionDenied => "permission denied",
            Self::DeviceNotFound => "device not found",
            Self::DeviceBusy => "device busy",
            Self::ConstraintsUnsatisfiable => "constraints unsatisfiable",
            Self::SecurityBlocked => "security blocked",
            Self::Aborted => "aborted",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Main error type for media operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// Camera acquisition failed
    #[error("Camera acquisition failed ({kind}): {message}")]
    Acquisition {
        /// Classified failure
        kind: AcquisitionErrorKind,
        /// Backend-specific detail
        message: String,
    },

    /// The video sink never reported dimensions
    #[error("Video loading timeout after {duration:?}")]
    VideoLoadTimeout {
        /// How long we waited
        duration: Duration,
    },

    /// The video sink reported an error while loading or playing
    #[error("Video error: {message}")]
    VideoSink {
        /// Error message
        message: String,
    },

    /// Capture not active error
    #[error("Capture not active")]
    CaptureNotActive,

    /// Encoding a still frame failed
    #[error("Encoding failed: {reason}")]
    EncodingFailed {
        /// Failure reason
        reason: String,
    },

    /// Invalid frame data error
    #[error("Invalid frame data: expected {expected} bytes, got {actual}")]
    InvalidFrameData {
        /// Expected data size
        expected: usize,
        /// Actual data size
        actual: usize,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Shorthand for an acquisition failure
    pub fn acquisition(kind: AcquisitionErrorKind, message: impl Into<String>) -> Self {
        MediaError::Acquisition {
            kind,
            message: message.into(),
        }
    }

    /// Acquisition kind, if this is an acquisition failure
    pub fn acquisition_kind(&self) -> Option<AcquisitionErrorKind> {
        match self {
            MediaError::Acquisition { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Human-readable status line
    pub fn status_message(&self) -> String {
        match self {
            MediaError::Acquisition {
                kind: AcquisitionErrorKind::Other,
                message,
            } => format!("Failed to access camera: {message}"),
            MediaError::Acquisition { kind, .. } => kind.status_message().to_string(),
            MediaError::VideoLoadTimeout { .. } => "Video loading timeout".to_string(),
            MediaError::VideoSink { message } => format!("Video error: {message}"),
            MediaError::CaptureNotActive => "Camera is not active.".to_string(),
            other => other.to_string(),
        }
    }

    /// Check if error is recoverable by simply trying again
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::Acquisition { kind, .. } => matches!(
                kind,
                AcquisitionErrorKind::DeviceBusy
                    | AcquisitionErrorKind::Aborted
                    | AcquisitionErrorKind::Other
            ),
            MediaError::VideoLoadTimeout { .. } => true,
            MediaError::VideoSink { .. } => true,
            MediaError::CaptureNotActive => false,
            MediaError::EncodingFailed { .. } => false,
            MediaError::InvalidFrameData { .. } => false,
            MediaError::InvalidConfiguration { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::Acquisition { kind, .. } => match kind {
                AcquisitionErrorKind::PermissionDenied | AcquisitionErrorKind::SecurityBlocked => {
                    ErrorCategory::Permission
                }
                _ => ErrorCategory::Device,
            },
            MediaError::VideoLoadTimeout { .. } | MediaError::VideoSink { .. } => {
                ErrorCategory::Video
            }
            MediaError::CaptureNotActive => ErrorCategory::State,
            MediaError::EncodingFailed { .. } | MediaError::InvalidFrameData { .. } => {
                ErrorCategory::Data
            }
            MediaError::InvalidConfiguration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Permission and policy refusals
    Permission,
    /// Device and hardware errors
    Device,
    /// Video sink errors
    Video,
    /// State management errors
    State,
    /// Frame data and encoding errors
    Data,
    /// Configuration and parameter errors
    Configuration,
}
