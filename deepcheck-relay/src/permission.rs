//! Permission capabilities on both ends of the relay

use crate::error::RelayResult;
use crate::protocol::{PermissionRequestReply, PermissionUpdate};
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

/// Client-side view of a relay: how a restricted context negotiates camera
/// permission
#[async_trait]
pub trait PermissionRelay: Send + Sync {
    /// Whether the host already holds camera permission
    async fn check_permission(&self) -> RelayResult<bool>;

    /// Ask the host to prompt for camera permission; `true` when granted
    async fn request_permission(&self) -> RelayResult<bool>;

    /// Unsolicited permission changes pushed by the host
    fn subscribe(&self) -> broadcast::Receiver<PermissionUpdate>;
}

/// Host-side source of truth for camera permission
#[async_trait]
pub trait PermissionAuthority: Send + Sync {
    /// Current verdict without prompting
    async fn query(&self) -> bool;

    /// Prompt (if needed) and report the verdict
    async fn request(&self) -> PermissionRequestReply;
}

/// Authority that remembers one decision
///
/// Before any decision exists, a request is answered with `prompt_answer`
/// and that answer is remembered, the way a browser remembers a choice made
/// in its permission prompt.
#[derive(Debug)]
pub struct PermissionStore {
    decision: RwLock<Option<bool>>,
    prompt_answer: bool,
}

impl PermissionStore {
    /// Undecided store answering future prompts with `prompt_answer`
    pub fn new(prompt_answer: bool) -> Self {
        Self {
            decision: RwLock::new(None),
            prompt_answer,
        }
    }

    /// Store with permission already granted
    pub fn granted() -> Self {
        let store = Self::new(true);
        store.set(true);
        store
    }

    /// Store with permission already refused
    pub fn denied() -> Self {
        let store = Self::new(false);
        store.set(false);
        store
    }

    /// Record a decision
    pub fn set(&self, granted: bool) {
        debug!(granted, "Permission decision recorded");
        *self.decision.write() = Some(granted);
    }

    /// Forget the decision so the next request prompts again
    pub fn reset(&self) {
        *self.decision.write() = None;
    }

    /// Current decision, if any
    pub fn decision(&self) -> Option<bool> {
        *self.decision.read()
    }
}

#[async_trait]
impl PermissionAuthority for PermissionStore {
    async fn query(&self) -> bool {
        self.decision() == Some(true)
    }

    async fn request(&self) -> PermissionRequestReply {
        let granted = match self.decision() {
            Some(decision) => decision,
            None => {
                self.set(self.prompt_answer);
                self.prompt_answer
            }
        };
        if granted {
            PermissionRequestReply::granted(true)
        } else {
            PermissionRequestReply::failed("Permission denied")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_remembers_prompt_answer() {
        let store = PermissionStore::new(true);
        assert!(!store.query().await);
        assert_eq!(store.decision(), None);

        assert!(store.request().await.success);
        assert!(store.query().await);

        store.reset();
        assert!(!store.query().await);
    }

    #[tokio::test]
    async fn test_denied_store() {
        let store = PermissionStore::denied();
        let reply = store.request().await;
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("Permission denied"));

        store.set(true);
        assert!(store.request().await.success);
    }
}
