//! Controller-level error type and user-facing status reports

use crate::{ControllerState, DeepCheckError, MediaError, RelayError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status line shown when the host page cannot be reached
pub const RELAY_UNAVAILABLE_MESSAGE: &str =
    "Unable to reach the page to request camera permission. Please reload the page and try again.";

/// Errors surfaced by the capture controller
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Camera acquisition or frame capture failed
    #[error(transparent)]
    Media(#[from] MediaError),

    /// The permission relay failed
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// The analysis backend call failed
    #[error(transparent)]
    Analysis(#[from] DeepCheckError),

    /// Operation not allowed in the current state
    #[error("Operation requires state {expected}, controller is {actual}")]
    InvalidState {
        /// State the operation needs
        expected: ControllerState,
        /// State the controller was in
        actual: ControllerState,
    },
}

/// Result type alias for controller operations
pub type ControllerResult<T> = Result<T, ControllerError>;

impl ControllerError {
    /// Human-readable status line for this failure
    pub fn status_message(&self) -> String {
        match self {
            ControllerError::Media(e) => e.status_message(),
            ControllerError::Relay(e) if e.is_unavailable() => {
                RELAY_UNAVAILABLE_MESSAGE.to_string()
            }
            ControllerError::Relay(e) => format!("Camera permission request failed: {e}"),
            ControllerError::Analysis(e) => e.to_string(),
            ControllerError::InvalidState { actual, .. } => {
                format!("Camera is not ready ({actual}).")
            }
        }
    }

    /// Whether the user should be pointed at the dedicated permission page
    pub fn offers_permission_page(&self) -> bool {
        match self {
            ControllerError::Media(e) => e
                .acquisition_kind()
                .is_some_and(|kind| kind.offers_permission_page()),
            _ => false,
        }
    }

    /// Whether this failure leaves the controller in the `Denied` state
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            ControllerError::Media(MediaError::Acquisition {
                kind: crate::AcquisitionErrorKind::PermissionDenied,
                ..
            })
        )
    }
}

/// Severity of a status report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Progress or neutral information
    Info,
    /// An operation completed
    Success,
    /// An operation failed
    Error,
}

/// A status line for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Text to show
    pub message: String,
    /// Severity
    pub kind: StatusKind,
    /// Whether to offer the dedicated permission page
    pub offer_permission_page: bool,
}

impl StatusReport {
    /// Informational status
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Info,
            offer_permission_page: false,
        }
    }

    /// Success status
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Success,
            offer_permission_page: false,
        }
    }

    /// Error status without a permission page offer
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Error,
            offer_permission_page: false,
        }
    }

    /// Whether this report describes a failure
    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self::info("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AcquisitionErrorKind;

    #[test]
    fn test_status_messages_are_distinct() {
        let errors: Vec<ControllerError> = vec![
            MediaError::acquisition(AcquisitionErrorKind::PermissionDenied, "denied").into(),
            MediaError::acquisition(AcquisitionErrorKind::DeviceNotFound, "none").into(),
            MediaError::acquisition(AcquisitionErrorKind::DeviceBusy, "busy").into(),
            MediaError::acquisition(AcquisitionErrorKind::ConstraintsUnsatisfiable, "size").into(),
            MediaError::acquisition(AcquisitionErrorKind::SecurityBlocked, "blocked").into(),
            MediaError::acquisition(AcquisitionErrorKind::Aborted, "aborted").into(),
            MediaError::acquisition(AcquisitionErrorKind::Other, "boom").into(),
            MediaError::VideoLoadTimeout {
                duration: std::time::Duration::from_secs(10),
            }
            .into(),
            RelayError::unavailable("closed").into(),
        ];

        let mut messages: Vec<String> = errors.iter().map(|e| e.status_message()).collect();
        let total = messages.len();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), total);
    }

    #[test]
    fn test_permission_page_offer() {
        let denied: ControllerError =
            MediaError::acquisition(AcquisitionErrorKind::PermissionDenied, "denied").into();
        assert!(denied.offers_permission_page());
        assert!(denied.is_permission_denied());

        let blocked: ControllerError =
            MediaError::acquisition(AcquisitionErrorKind::SecurityBlocked, "blocked").into();
        assert!(blocked.offers_permission_page());
        assert!(!blocked.is_permission_denied());

        let relay: ControllerError = RelayError::unavailable("closed").into();
        assert!(!relay.offers_permission_page());
        assert_eq!(relay.status_message(), RELAY_UNAVAILABLE_MESSAGE);
    }
}
