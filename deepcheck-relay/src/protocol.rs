//! Relay protocol messages
//!
//! Two request/response pairs plus one unsolicited push. Requests and pushes
//! carry an `action` discriminator; replies do not, and are matched to the
//! single outstanding request.

use serde::{Deserialize, Serialize};

/// Client-to-host requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RelayRequest {
    /// Prompt for camera permission; answered with [`PermissionRequestReply`]
    RequestCameraPermission,
    /// Ask whether permission is already granted; answered with
    /// [`PermissionStatusReply`]
    CheckCameraPermission,
}

/// Reply to [`RelayRequest::RequestCameraPermission`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequestReply {
    /// Whether permission ended up granted
    pub success: bool,
    /// Why the prompt failed, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PermissionRequestReply {
    /// Plain verdict without an error
    pub fn granted(success: bool) -> Self {
        Self {
            success,
            error: None,
        }
    }

    /// Failed prompt
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Reply to [`RelayRequest::CheckCameraPermission`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionStatusReply {
    /// Whether permission is currently granted
    pub granted: bool,
}

/// Payload of an unsolicited permission change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionUpdate {
    /// New verdict
    pub granted: bool,
    /// Error attached to a refusal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PermissionUpdate {
    /// Permission was granted
    pub fn granted() -> Self {
        Self {
            granted: true,
            error: None,
        }
    }

    /// Permission was refused
    pub fn denied(error: Option<String>) -> Self {
        Self {
            granted: false,
            error,
        }
    }
}

/// Host-to-client pushes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RelayPush {
    /// Camera permission changed outside of any request
    CameraPermissionUpdate(PermissionUpdate),
}
