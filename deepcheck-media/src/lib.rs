//! # DeepCheck Media
//!
//! Camera acquisition and still-frame capture for DeepCheck. A
//! [`CameraDevice`] produces a [`MediaStream`]; a [`VideoSink`] waits (with a
//! bound) for the stream's metadata and plays it; a [`CaptureSession`] ties
//! the two together and encodes frames as JPEG data-URIs.

#![warn(clippy::all)]

pub mod capture;
pub mod constraints;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod tracks;
pub mod video_sink;

// Re-export main types
pub use capture::synthetic::{SyntheticBehavior, SyntheticCamera};
pub use capture::{default_camera, CameraDevice, MediaStream};
pub use constraints::{CaptureConstraints, ConstraintRange, FacingMode};
pub use error::{AcquisitionErrorKind, ErrorCategory, MediaError, MediaResult};
pub use session::CaptureSession;
pub use snapshot::{encode_jpeg, frame_to_data_uri, DEFAULT_JPEG_QUALITY};
pub use tracks::{VideoFrame, VideoPixelFormat, VideoResolution};
pub use video_sink::{VideoSink, METADATA_TIMEOUT};

#[cfg(feature = "native")]
pub use capture::native::NativeCamera;
