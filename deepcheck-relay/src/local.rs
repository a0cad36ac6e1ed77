//! In-process relay

use crate::error::RelayResult;
use crate::permission::{PermissionAuthority, PermissionRelay};
use crate::protocol::PermissionUpdate;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Relay whose host lives in the same process
///
/// Requests go straight to the authority; pushes are injected with
/// [`LocalRelay::push`].
#[derive(Clone)]
pub struct LocalRelay {
    authority: Arc<dyn PermissionAuthority>,
    updates: broadcast::Sender<PermissionUpdate>,
}

impl LocalRelay {
    /// Relay answering from `authority`
    pub fn new(authority: Arc<dyn PermissionAuthority>) -> Self {
        let (updates, _) = broadcast::channel(16);
        Self { authority, updates }
    }

    /// Deliver a permission change to every subscriber; returns how many
    /// subscribers saw it
    pub fn push(&self, update: PermissionUpdate) -> usize {
        debug!(granted = update.granted, "Pushing local permission update");
        self.updates.send(update).unwrap_or(0)
    }
}

#[async_trait]
impl PermissionRelay for LocalRelay {
    async fn check_permission(&self) -> RelayResult<bool> {
        Ok(self.authority.query().await)
    }

    async fn request_permission(&self) -> RelayResult<bool> {
        Ok(self.authority.request().await.success)
    }

    fn subscribe(&self) -> broadcast::Receiver<PermissionUpdate> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::PermissionStore;

    #[tokio::test]
    async fn test_local_relay_round_trip() {
        let store = Arc::new(PermissionStore::new(false));
        let relay = LocalRelay::new(store.clone());

        assert!(!relay.check_permission().await.unwrap());
        assert!(!relay.request_permission().await.unwrap());

        store.set(true);
        assert!(relay.check_permission().await.unwrap());
    }

    #[tokio::test]
    async fn test_push_reaches_subscribers() {
        let relay = LocalRelay::new(Arc::new(PermissionStore::granted()));
        assert_eq!(relay.push(PermissionUpdate::granted()), 0);

        let mut updates = relay.subscribe();
        assert_eq!(relay.push(PermissionUpdate::denied(None)), 1);
        assert_eq!(updates.recv().await.unwrap(), PermissionUpdate::denied(None));
    }
}
