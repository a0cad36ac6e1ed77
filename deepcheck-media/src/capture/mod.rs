//! Camera device abstraction
//!
//! A [`CameraDevice`] turns constraints into a live [`MediaStream`]. The
//! stream plays the role of a browser video element's source: it reports its
//! native dimensions once they are known, starts delivering frames when
//! played and releases every track on `stop`.

#[cfg(feature = "native")]
pub mod native;
pub mod synthetic;

use crate::constraints::CaptureConstraints;
use crate::error::MediaResult;
use crate::tracks::{VideoFrame, VideoResolution};
use async_trait::async_trait;
use std::sync::Arc;

/// Something that can hand out camera streams
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Human-readable device name
    fn name(&self) -> &str;

    /// Acquire a stream satisfying `constraints`
    ///
    /// Failures must be reported as
    /// [`MediaError::Acquisition`](crate::error::MediaError::Acquisition) so
    /// callers can classify them.
    async fn open(&self, constraints: &CaptureConstraints) -> MediaResult<Box<dyn MediaStream>>;
}

/// A live camera stream
#[async_trait]
pub trait MediaStream: Send + Sync {
    /// Stream identifier
    fn id(&self) -> &str;

    /// Resolve once the native frame dimensions are known
    ///
    /// May never resolve if the device stalls; callers bound it.
    async fn metadata(&self) -> MediaResult<VideoResolution>;

    /// Start frame delivery
    fn play(&self) -> MediaResult<()>;

    /// Most recent frame at native resolution
    fn current_frame(&self) -> MediaResult<VideoFrame>;

    /// Stop every track. Must be idempotent.
    fn stop(&self);

    /// Whether any track is still running
    fn is_live(&self) -> bool;
}

/// Get the camera backend for this build
///
/// With the `native` feature this is the first system camera; otherwise a
/// synthetic test-pattern camera.
pub fn default_camera() -> Arc<dyn CameraDevice> {
    #[cfg(feature = "native")]
    {
        Arc::new(native::NativeCamera::new(0))
    }
    #[cfg(not(feature = "native"))]
    {
        Arc::new(synthetic::SyntheticCamera::new())
    }
}
