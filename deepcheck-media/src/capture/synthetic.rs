//! Synthetic camera producing a moving test pattern
//!
//! Used when no hardware backend is compiled in, and by tests that need to
//! script acquisition failures or a stalled video sink.

use super::{CameraDevice, MediaStream};
use crate::constraints::CaptureConstraints;
use crate::error::{AcquisitionErrorKind, MediaError, MediaResult};
use crate::tracks::{VideoFrame, VideoPixelFormat, VideoResolution};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// How the synthetic camera behaves when opened
#[derive(Debug, Clone, PartialEq)]
pub enum SyntheticBehavior {
    /// Opens and reports metadata immediately
    Available,
    /// Opening fails with the given kind
    Fail(AcquisitionErrorKind),
    /// Opens, but the sink never learns the frame dimensions
    NeverReady,
    /// Opens and reports metadata after a delay
    ReadyAfter(Duration),
    /// Opens, then the sink reports an error while loading
    SinkError(String),
}

/// Test-pattern camera
#[derive(Debug)]
pub struct SyntheticCamera {
    name: String,
    modes: Vec<VideoResolution>,
    frame_rate: f64,
    behavior: SyntheticBehavior,
    opened: AtomicUsize,
    live_streams: Arc<AtomicUsize>,
}

impl SyntheticCamera {
    /// Camera supporting the common low-resolution modes
    pub fn new() -> Self {
        Self::with_modes(vec![
            VideoResolution::QVGA,
            VideoResolution::VGA,
            VideoResolution::HD,
        ])
    }

    /// Camera supporting exactly `modes`
    pub fn with_modes(modes: Vec<VideoResolution>) -> Self {
        Self {
            name: "Synthetic Camera".to_string(),
            modes,
            frame_rate: 30.0,
            behavior: SyntheticBehavior::Available,
            opened: AtomicUsize::new(0),
            live_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Change the scripted behavior
    pub fn with_behavior(mut self, behavior: SyntheticBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Change the rate the camera runs at (30 fps by default)
    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = fps;
        self
    }

    /// How many streams were handed out
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// How many handed-out streams have not been stopped yet
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraDevice for SyntheticCamera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self, constraints: &CaptureConstraints) -> MediaResult<Box<dyn MediaStream>> {
        constraints.validate()?;

        if let SyntheticBehavior::Fail(kind) = &self.behavior {
            debug!(%kind, "Synthetic camera refusing to open");
            return Err(MediaError::acquisition(*kind, "synthetic failure"));
        }

        let resolution = constraints.select_resolution(&self.modes).ok_or_else(|| {
            MediaError::acquisition(
                AcquisitionErrorKind::ConstraintsUnsatisfiable,
                format!(
                    "no mode within {}x{}",
                    constraints.width.max, constraints.height.max
                ),
            )
        })?;
        constraints.check_frame_rate(self.frame_rate)?;

        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live_streams.fetch_add(1, Ordering::SeqCst);

        let stream = SyntheticStream {
            id: Uuid::new_v4().to_string(),
            resolution,
            behavior: self.behavior.clone(),
            started: Instant::now(),
            playing: AtomicBool::new(false),
            live: AtomicBool::new(true),
            live_streams: self.live_streams.clone(),
        };
        info!(
            stream_id = %stream.id,
            width = resolution.width,
            height = resolution.height,
            "Synthetic camera opened"
        );
        Ok(Box::new(stream))
    }
}

struct SyntheticStream {
    id: String,
    resolution: VideoResolution,
    behavior: SyntheticBehavior,
    started: Instant,
    playing: AtomicBool,
    live: AtomicBool,
    live_streams: Arc<AtomicUsize>,
}

impl SyntheticStream {
    fn render(&self) -> Vec<u8> {
        let VideoResolution { width, height } = self.resolution;
        let phase = (self.started.elapsed().as_millis() / 40 % 256) as u8;
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 255 / width.max(1)) as u8);
                data.push((y * 255 / height.max(1)) as u8);
                data.push(phase);
            }
        }
        data
    }
}

#[async_trait]
impl MediaStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    async fn metadata(&self) -> MediaResult<VideoResolution> {
        match &self.behavior {
            SyntheticBehavior::NeverReady => std::future::pending().await,
            SyntheticBehavior::ReadyAfter(delay) => tokio::time::sleep(*delay).await,
            SyntheticBehavior::SinkError(message) => {
                return Err(MediaError::VideoSink {
                    message: message.clone(),
                })
            }
            SyntheticBehavior::Available | SyntheticBehavior::Fail(_) => {}
        }
        Ok(self.resolution)
    }

    fn play(&self) -> MediaResult<()> {
        if !self.is_live() {
            return Err(MediaError::CaptureNotActive);
        }
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn current_frame(&self) -> MediaResult<VideoFrame> {
        if !self.is_live() || !self.playing.load(Ordering::SeqCst) {
            return Err(MediaError::CaptureNotActive);
        }
        VideoFrame::new(
            self.resolution.width,
            self.resolution.height,
            VideoPixelFormat::Rgb24,
            self.render(),
            self.started.elapsed().as_millis() as u64,
        )
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.playing.store(false, Ordering::SeqCst);
            self.live_streams.fetch_sub(1, Ordering::SeqCst);
            debug!(stream_id = %self.id, "Synthetic stream stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}
