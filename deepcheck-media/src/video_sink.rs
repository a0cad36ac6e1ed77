//! Video sink: binds a stream, waits for its metadata and plays it

use crate::capture::MediaStream;
use crate::error::{MediaError, MediaResult};
use crate::tracks::{VideoFrame, VideoResolution};
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on the metadata wait
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Consumer side of a camera stream
pub struct VideoSink {
    stream: Box<dyn MediaStream>,
    resolution: Option<VideoResolution>,
    playing: bool,
}

impl VideoSink {
    /// Attach to a freshly acquired stream
    pub fn bind(stream: Box<dyn MediaStream>) -> Self {
        debug!(stream_id = %stream.id(), "Binding stream to video sink");
        Self {
            stream,
            resolution: None,
            playing: false,
        }
    }

    /// Wait until the stream reports its native dimensions
    ///
    /// Never waits longer than `limit`; on timeout the stream is left bound
    /// and the caller decides whether to stop it.
    pub async fn wait_for_metadata(&mut self, limit: Duration) -> MediaResult<VideoResolution> {
        let resolution = match tokio::time::timeout(limit, self.stream.metadata()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(stream_id = %self.stream.id(), ?limit, "Video metadata wait timed out");
                return Err(MediaError::VideoLoadTimeout { duration: limit });
            }
        };

        if !resolution.is_valid() {
            return Err(MediaError::VideoSink {
                message: format!(
                    "stream reported empty dimensions {}x{}",
                    resolution.width, resolution.height
                ),
            });
        }

        debug!(
            stream_id = %self.stream.id(),
            width = resolution.width,
            height = resolution.height,
            "Video metadata loaded"
        );
        self.resolution = Some(resolution);
        Ok(resolution)
    }

    /// Start playback; metadata must have been loaded
    pub fn play(&mut self) -> MediaResult<()> {
        if self.resolution.is_none() {
            return Err(MediaError::VideoSink {
                message: "cannot play before metadata is loaded".to_string(),
            });
        }
        self.stream.play()?;
        self.playing = true;
        Ok(())
    }

    /// Native dimensions, once known
    pub fn resolution(&self) -> Option<VideoResolution> {
        self.resolution
    }

    /// Whether playback has started and the stream is still live
    pub fn is_playing(&self) -> bool {
        self.playing && self.stream.is_live()
    }

    /// Current frame from the playing stream
    pub fn current_frame(&self) -> MediaResult<VideoFrame> {
        if !self.is_playing() {
            return Err(MediaError::CaptureNotActive);
        }
        self.stream.current_frame()
    }

    /// Stream identifier
    pub fn stream_id(&self) -> &str {
        self.stream.id()
    }

    /// Stop every track and detach from the stream
    pub fn release(mut self) {
        self.stop_tracks();
    }

    fn stop_tracks(&mut self) {
        if self.stream.is_live() {
            debug!(stream_id = %self.stream.id(), "Stopping all tracks");
        }
        self.stream.stop();
        self.playing = false;
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}
