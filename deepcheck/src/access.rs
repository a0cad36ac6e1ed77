//! How the controller reaches the camera

use crate::PermissionRelay;
use std::fmt;
use std::sync::Arc;

/// Camera access strategy
///
/// `Direct` trusts the device layer to prompt for permission. `Relayed` is
/// for restricted surfaces that cannot prompt themselves and must ask a
/// host page through a [`PermissionRelay`] first.
#[derive(Clone, Default)]
pub enum CameraAccess {
    /// Open the device directly
    #[default]
    Direct,
    /// Negotiate permission through a relay before opening the device
    Relayed {
        /// Relay to the host page
        relay: Arc<dyn PermissionRelay>,
        /// Dedicated page that can grant permission, offered on denial
        permission_page: Option<String>,
    },
}

impl CameraAccess {
    /// Relayed access without a permission page
    pub fn relayed(relay: Arc<dyn PermissionRelay>) -> Self {
        CameraAccess::Relayed {
            relay,
            permission_page: None,
        }
    }

    /// Relay, if any
    pub fn relay(&self) -> Option<&Arc<dyn PermissionRelay>> {
        match self {
            CameraAccess::Direct => None,
            CameraAccess::Relayed { relay, .. } => Some(relay),
        }
    }

    /// Permission page, if any
    pub fn permission_page(&self) -> Option<&str> {
        match self {
            CameraAccess::Direct => None,
            CameraAccess::Relayed {
                permission_page, ..
            } => permission_page.as_deref(),
        }
    }

    /// Whether permission is negotiated through a relay
    pub fn is_relayed(&self) -> bool {
        matches!(self, CameraAccess::Relayed { .. })
    }
}

impl fmt::Debug for CameraAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraAccess::Direct => f.write_str("Direct"),
            CameraAccess::Relayed {
                permission_page, ..
            } => f
                .debug_struct("Relayed")
                .field("permission_page", permission_page)
                .finish_non_exhaustive(),
        }
    }
}
