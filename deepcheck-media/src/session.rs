//! Capture session: one acquired, playing camera stream

use crate::capture::CameraDevice;
use crate::constraints::CaptureConstraints;
use crate::error::{MediaError, MediaResult};
use crate::snapshot::frame_to_data_uri;
use crate::tracks::VideoResolution;
use crate::video_sink::VideoSink;
use deepcheck_core::DataUri;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A live camera stream bound to a playing video sink
///
/// Dropping the session stops every track.
pub struct CaptureSession {
    sink: Option<VideoSink>,
    resolution: VideoResolution,
    started_at: Instant,
    last_error: Option<String>,
}

impl CaptureSession {
    /// Acquire a camera and bring it to the playing state
    ///
    /// Steps run strictly in order: open, bind, wait for metadata (bounded by
    /// `metadata_timeout`), play. Any failure stops the stream before
    /// returning.
    pub async fn start(
        camera: &dyn CameraDevice,
        constraints: &CaptureConstraints,
        metadata_timeout: Duration,
    ) -> MediaResult<Self> {
        debug!(device = camera.name(), "Opening camera");
        let stream = camera.open(constraints).await?;

        // The sink stops the stream if we bail out below
        let mut sink = VideoSink::bind(stream);
        let resolution = sink.wait_for_metadata(metadata_timeout).await?;
        sink.play()?;

        info!(
            stream_id = sink.stream_id(),
            width = resolution.width,
            height = resolution.height,
            "Capture session active"
        );
        Ok(Self {
            sink: Some(sink),
            resolution,
            started_at: Instant::now(),
            last_error: None,
        })
    }

    /// Whether the stream is still delivering frames
    pub fn is_active(&self) -> bool {
        self.sink.as_ref().is_some_and(VideoSink::is_playing)
    }

    /// Native stream dimensions
    pub fn resolution(&self) -> VideoResolution {
        self.resolution
    }

    /// Time since playback started
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Last capture error seen on this session
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Stream identifier, while the session is live
    pub fn stream_id(&self) -> Option<&str> {
        self.sink.as_ref().map(VideoSink::stream_id)
    }

    /// Encode the current frame as a JPEG data-URI at native dimensions
    pub fn capture_frame(&mut self, quality: u8) -> MediaResult<DataUri> {
        let result = self
            .sink
            .as_ref()
            .ok_or(MediaError::CaptureNotActive)
            .and_then(VideoSink::current_frame)
            .and_then(|frame| frame_to_data_uri(&frame, quality));

        match &result {
            Ok(uri) => {
                self.last_error = None;
                debug!(bytes = uri.len(), "Captured frame");
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }

    /// Stop every track and detach the sink. Idempotent.
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            info!(
                stream_id = sink.stream_id(),
                uptime = ?self.uptime(),
                "Stopping capture session"
            );
            sink.release();
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}
