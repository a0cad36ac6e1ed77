//! Controller events

use crate::{AnalysisResult, ControllerState, PermissionState, StatusReport};
use tokio::sync::broadcast;
use tracing::debug;

/// Events emitted by a [`CaptureController`](crate::CaptureController)
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// The controller moved between states
    StateChanged {
        /// Previous state
        from: ControllerState,
        /// New state
        to: ControllerState,
    },
    /// The camera permission state changed
    PermissionChanged {
        /// New permission state
        permission: PermissionState,
    },
    /// A new status line is available
    Status(StatusReport),
    /// A frame was captured
    FrameCaptured {
        /// Encoded JPEG size
        bytes: usize,
    },
    /// The backend returned a verdict
    AnalysisCompleted {
        /// Normalized result
        result: AnalysisResult,
    },
    /// The backend call failed
    AnalysisFailed {
        /// Failure description
        error: String,
    },
}

impl ControllerEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            ControllerEvent::StateChanged { .. } => "state_changed",
            ControllerEvent::PermissionChanged { .. } => "permission_changed",
            ControllerEvent::Status(_) => "status",
            ControllerEvent::FrameCaptured { .. } => "frame_captured",
            ControllerEvent::AnalysisCompleted { .. } => "analysis_completed",
            ControllerEvent::AnalysisFailed { .. } => "analysis_failed",
        }
    }

    /// Check if this is an error event
    pub fn is_error_event(&self) -> bool {
        match self {
            ControllerEvent::AnalysisFailed { .. } => true,
            ControllerEvent::Status(report) => report.is_error(),
            _ => false,
        }
    }
}

/// Stream of controller events for async iteration
#[derive(Debug)]
pub struct EventStream {
    receiver: broadcast::Receiver<ControllerEvent>,
}

impl EventStream {
    /// Create a new event stream with a receiver
    pub fn new(receiver: broadcast::Receiver<ControllerEvent>) -> Self {
        Self { receiver }
    }

    /// Get the next event, or `None` once the controller is gone
    pub async fn next(&mut self) -> Option<ControllerEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to get the next event without waiting
    pub fn try_next(&mut self) -> Option<ControllerEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
