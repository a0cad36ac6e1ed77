//! # DeepCheck Relay
//!
//! Camera permission relay. A client running somewhere it may not prompt
//! for the camera (an extension popup, a sandboxed view) asks a trusted
//! host to check or request permission on its behalf, and listens for
//! unsolicited permission changes pushed by that host.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod host;
pub mod local;
pub mod permission;
pub mod protocol;

// Re-export main types
pub use client::WsRelayClient;
pub use error::{RelayError, RelayResult};
pub use host::RelayHost;
pub use local::LocalRelay;
pub use permission::{PermissionAuthority, PermissionRelay, PermissionStore};
pub use protocol::{
    PermissionRequestReply, PermissionStatusReply, PermissionUpdate, RelayPush, RelayRequest,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        assert_eq!(
            serde_json::to_value(RelayRequest::RequestCameraPermission).unwrap(),
            json!({"action": "requestCameraPermission"})
        );
        assert_eq!(
            serde_json::to_value(RelayRequest::CheckCameraPermission).unwrap(),
            json!({"action": "checkCameraPermission"})
        );
        let parsed: RelayRequest =
            serde_json::from_str(r#"{"action":"checkCameraPermission"}"#).unwrap();
        assert_eq!(parsed, RelayRequest::CheckCameraPermission);
    }

    #[test]
    fn test_reply_wire_format() {
        let reply: PermissionRequestReply = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(reply.success);
        assert!(reply.error.is_none());
        assert_eq!(
            serde_json::to_value(PermissionRequestReply::granted(true)).unwrap(),
            json!({"success": true})
        );

        let status: PermissionStatusReply = serde_json::from_str(r#"{"granted":false}"#).unwrap();
        assert!(!status.granted);
    }

    #[test]
    fn test_push_wire_format() {
        let push = RelayPush::CameraPermissionUpdate(PermissionUpdate {
            granted: false,
            error: Some("dismissed".to_string()),
        });
        assert_eq!(
            serde_json::to_value(&push).unwrap(),
            json!({"action": "cameraPermissionUpdate", "granted": false, "error": "dismissed"})
        );

        let parsed: RelayPush =
            serde_json::from_str(r#"{"action":"cameraPermissionUpdate","granted":true}"#).unwrap();
        assert_eq!(
            parsed,
            RelayPush::CameraPermissionUpdate(PermissionUpdate::granted())
        );
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(serde_json::from_str::<RelayRequest>(r#"{"action":"openSettings"}"#).is_err());
    }
}
