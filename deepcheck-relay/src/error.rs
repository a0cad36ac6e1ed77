//! Relay error types

use std::net::SocketAddr;
use thiserror::Error;

/// Errors raised while talking to, or serving as, a permission relay
#[derive(Error, Debug)]
pub enum RelayError {
    /// The host cannot be reached or went away mid-request
    #[error("Relay unavailable: {reason}")]
    Unavailable {
        /// Why the relay is unreachable
        reason: String,
    },

    /// WebSocket handshake or transport failure
    #[error("Relay transport error: {source}")]
    Transport {
        /// Underlying WebSocket error
        #[from]
        source: tungstenite::Error,
    },

    /// A message could not be encoded or decoded
    #[error("Invalid relay message: {message}")]
    InvalidMessage {
        /// Offending message text
        message: String,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// The relay host could not bind its listener
    #[error("Failed to start relay host on {address}: {source}")]
    Bind {
        /// Address we tried to bind
        address: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    /// Shorthand for an unavailable relay
    pub fn unavailable(reason: impl Into<String>) -> Self {
        RelayError::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether the failure means the host could not be reached at all
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RelayError::Unavailable { .. } | RelayError::Transport { .. }
        )
    }
}
