//! System camera backend built on nokhwa
//!
//! nokhwa cameras are not `Send`, so each stream owns a dedicated capture
//! thread. The thread opens the device, reports the outcome, and then keeps
//! the latest decoded frame in shared state until the stream is stopped.

use super::{CameraDevice, MediaStream};
use crate::constraints::CaptureConstraints;
use crate::error::{AcquisitionErrorKind, MediaError, MediaResult};
use crate::tracks::{VideoFrame, VideoPixelFormat, VideoResolution};
use async_trait::async_trait;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Camera attached to this machine, selected by index
#[derive(Debug, Clone)]
pub struct NativeCamera {
    index: u32,
    name: String,
}

impl NativeCamera {
    /// Camera at `index` in the system's device list
    pub fn new(index: u32) -> Self {
        Self {
            index,
            name: format!("System Camera {index}"),
        }
    }
}

#[derive(Debug, Clone)]
enum ReadyState {
    Pending,
    Ready(VideoResolution),
    Failed(String),
}

struct Shared {
    latest: Mutex<Option<VideoFrame>>,
    live: AtomicBool,
    playing: AtomicBool,
}

fn classify(error: impl std::fmt::Display) -> MediaError {
    let message = error.to_string();
    MediaError::acquisition(AcquisitionErrorKind::from_message(&message), message)
}

#[async_trait]
impl CameraDevice for NativeCamera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self, constraints: &CaptureConstraints) -> MediaResult<Box<dyn MediaStream>> {
        constraints.validate()?;

        let ideal = constraints.ideal_resolution();
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(ideal.width, ideal.height),
                FrameFormat::MJPEG,
                constraints.frame_rate.ideal.round() as u32,
            ),
        ));
        let limits = constraints.clone();

        let shared = Arc::new(Shared {
            latest: Mutex::new(None),
            live: AtomicBool::new(true),
            playing: AtomicBool::new(false),
        });
        let (open_tx, open_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = watch::channel(ReadyState::Pending);

        let index = self.index;
        let thread_shared = shared.clone();
        std::thread::Builder::new()
            .name(format!("deepcheck-camera-{index}"))
            .spawn(move || {
                capture_loop(index, requested, &limits, thread_shared, open_tx, ready_tx)
            })
            .map_err(classify)?;

        match open_rx.await {
            Ok(result) => result?,
            Err(_) => {
                return Err(MediaError::acquisition(
                    AcquisitionErrorKind::Aborted,
                    "capture thread exited before opening the camera",
                ))
            }
        }

        let id = Uuid::new_v4().to_string();
        info!(stream_id = %id, device = %self.name, "Native camera opened");
        Ok(Box::new(NativeStream {
            id,
            shared,
            ready: ready_rx,
        }))
    }
}

fn capture_loop(
    index: u32,
    requested: RequestedFormat,
    limits: &CaptureConstraints,
    shared: Arc<Shared>,
    open_tx: oneshot::Sender<MediaResult<()>>,
    ready_tx: watch::Sender<ReadyState>,
) {
    let mut camera = match Camera::new(CameraIndex::Index(index), requested) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = open_tx.send(Err(classify(e)));
            return;
        }
    };
    if let Err(e) = camera.open_stream() {
        let _ = open_tx.send(Err(classify(e)));
        return;
    }

    let negotiated = camera.resolution();
    let negotiated = VideoResolution::new(negotiated.width(), negotiated.height());
    if !negotiated.fits_within(limits.max_resolution()) {
        let _ = camera.stop_stream();
        let _ = open_tx.send(Err(MediaError::acquisition(
            AcquisitionErrorKind::ConstraintsUnsatisfiable,
            format!(
                "camera negotiated {}x{}",
                negotiated.width, negotiated.height
            ),
        )));
        return;
    }
    if let Err(e) = limits.check_frame_rate(f64::from(camera.frame_rate())) {
        let _ = camera.stop_stream();
        let _ = open_tx.send(Err(e));
        return;
    }
    let _ = open_tx.send(Ok(()));

    let started = Instant::now();
    let mut announced = false;
    while shared.live.load(Ordering::SeqCst) {
        let buffer = match camera.frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!(error = %e, "Camera stopped delivering frames");
                let _ = ready_tx.send(ReadyState::Failed(e.to_string()));
                break;
            }
        };
        let image = match buffer.decode_image::<RgbFormat>() {
            Ok(image) => image,
            Err(e) => {
                debug!(error = %e, "Dropping undecodable frame");
                continue;
            }
        };

        let (width, height) = (image.width(), image.height());
        if !announced {
            let _ = ready_tx.send(ReadyState::Ready(VideoResolution::new(width, height)));
            announced = true;
        }
        if shared.playing.load(Ordering::SeqCst) {
            let timestamp = started.elapsed().as_millis() as u64;
            let frame = VideoFrame::new(
                width,
                height,
                VideoPixelFormat::Rgb24,
                image.into_raw(),
                timestamp,
            );
            match frame {
                Ok(frame) => *shared.latest.lock() = Some(frame),
                Err(e) => debug!(error = %e, "Dropping malformed frame"),
            }
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!(error = %e, "Failed to stop camera stream cleanly");
    }
    debug!(index, "Capture thread finished");
}

struct NativeStream {
    id: String,
    shared: Arc<Shared>,
    ready: watch::Receiver<ReadyState>,
}

#[async_trait]
impl MediaStream for NativeStream {
    fn id(&self) -> &str {
        &self.id
    }

    async fn metadata(&self) -> MediaResult<VideoResolution> {
        let mut ready = self.ready.clone();
        loop {
            let state = ready.borrow_and_update().clone();
            match state {
                ReadyState::Ready(resolution) => return Ok(resolution),
                ReadyState::Failed(message) => return Err(MediaError::VideoSink { message }),
                ReadyState::Pending => {}
            }
            if ready.changed().await.is_err() {
                return Err(MediaError::VideoSink {
                    message: "capture thread exited".to_string(),
                });
            }
        }
    }

    fn play(&self) -> MediaResult<()> {
        if !self.is_live() {
            return Err(MediaError::CaptureNotActive);
        }
        self.shared.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn current_frame(&self) -> MediaResult<VideoFrame> {
        if !self.is_live() {
            return Err(MediaError::CaptureNotActive);
        }
        self.shared
            .latest
            .lock()
            .clone()
            .ok_or(MediaError::CaptureNotActive)
    }

    fn stop(&self) {
        if self.shared.live.swap(false, Ordering::SeqCst) {
            self.shared.playing.store(false, Ordering::SeqCst);
            debug!(stream_id = %self.id, "Native stream stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.shared.live.load(Ordering::SeqCst)
    }
}
