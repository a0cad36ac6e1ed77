//! Camera capture and permission controller

use crate::{
    AcquisitionErrorKind, AnalysisResult, AnalysisService, CameraAccess, CameraDevice,
    CaptureConstraints, CaptureSession, ControllerConfig, ControllerError, ControllerEvent,
    ControllerResult, DataUri, DeepCheck, EventStream, MediaError, PermissionState,
    PermissionUpdate, StatusReport,
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Status shown once a previously denied permission is granted
pub const PERMISSION_GRANTED_RETRY_MESSAGE: &str =
    "Camera permission granted! Click 'Start Camera' to try again.";

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ControllerState {
    /// No camera session
    Idle,
    /// Negotiating permission and opening the camera
    RequestingPermission,
    /// Camera is playing
    Active,
    /// A captured frame is being analyzed
    Analyzing,
    /// The user refused camera access
    Denied,
    /// Acquisition failed for another reason
    Error,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Idle => "idle",
            ControllerState::RequestingPermission => "requesting permission",
            ControllerState::Active => "active",
            ControllerState::Analyzing => "analyzing",
            ControllerState::Denied => "denied",
            ControllerState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Builder for a [`CaptureController`]
pub struct ControllerBuilder {
    camera: Arc<dyn CameraDevice>,
    analysis: Arc<dyn AnalysisService>,
    access: CameraAccess,
    config: ControllerConfig,
}

impl ControllerBuilder {
    pub(crate) fn new(deepcheck: &DeepCheck, camera: Arc<dyn CameraDevice>) -> Self {
        Self {
            camera,
            analysis: deepcheck.analysis_service(),
            access: CameraAccess::Direct,
            config: ControllerConfig::default(),
        }
    }

    /// Camera access strategy
    pub fn access(mut self, access: CameraAccess) -> Self {
        self.access = access;
        self
    }

    /// Replace the analysis backend
    pub fn analysis_service(mut self, analysis: Arc<dyn AnalysisService>) -> Self {
        self.analysis = analysis;
        self
    }

    /// Replace the whole controller configuration
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Camera constraints
    pub fn constraints(mut self, constraints: CaptureConstraints) -> Self {
        self.config.constraints = constraints;
        self
    }

    /// Bound on the video metadata wait
    pub fn metadata_timeout(mut self, timeout: Duration) -> Self {
        self.config.metadata_timeout = timeout;
        self
    }

    /// JPEG quality for captured frames
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    /// Validate the configuration and create the controller
    pub fn build(self) -> ControllerResult<CaptureController> {
        self.config.constraints.validate()?;
        if !(1..=100).contains(&self.config.jpeg_quality) {
            return Err(MediaError::InvalidConfiguration {
                message: format!("JPEG quality must be 1-100, got {}", self.config.jpeg_quality),
            }
            .into());
        }
        Ok(CaptureController::new(
            self.camera,
            self.access,
            self.analysis,
            self.config,
        ))
    }
}

struct Inner {
    camera: Arc<dyn CameraDevice>,
    access: CameraAccess,
    analysis: Arc<dyn AnalysisService>,
    config: ControllerConfig,
    state: RwLock<ControllerState>,
    permission: RwLock<PermissionState>,
    status: RwLock<StatusReport>,
    session: Mutex<Option<CaptureSession>>,
    events: broadcast::Sender<ControllerEvent>,
}

impl Inner {
    fn emit(&self, event: ControllerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn set_state(&self, to: ControllerState) {
        let from = std::mem::replace(&mut *self.state.write(), to);
        if from != to {
            debug!(%from, %to, "Controller state changed");
            self.emit(ControllerEvent::StateChanged { from, to });
        }
    }

    /// Move `from -> to` only if the controller is still in `from`
    fn transition(&self, from: ControllerState, to: ControllerState) -> bool {
        {
            let mut state = self.state.write();
            if *state != from {
                return false;
            }
            *state = to;
        }
        debug!(%from, %to, "Controller state changed");
        self.emit(ControllerEvent::StateChanged { from, to });
        true
    }

    fn set_permission(&self, permission: PermissionState) {
        let previous = std::mem::replace(&mut *self.permission.write(), permission);
        if previous != permission {
            self.emit(ControllerEvent::PermissionChanged { permission });
        }
    }

    fn set_status(&self, report: StatusReport) {
        *self.status.write() = report.clone();
        self.emit(ControllerEvent::Status(report));
    }

    /// The permission page exists only behind a relay
    fn permission_page_available(&self) -> bool {
        self.access.is_relayed()
    }

    fn report_failure(&self, error: &ControllerError) {
        self.set_status(StatusReport {
            message: error.status_message(),
            kind: crate::StatusKind::Error,
            offer_permission_page: self.permission_page_available()
                && error.offers_permission_page(),
        });
    }

    fn grab_frame(&self) -> ControllerResult<DataUri> {
        let frame = {
            let mut session = self.session.lock();
            let session = session.as_mut().ok_or(MediaError::CaptureNotActive)?;
            session.capture_frame(self.config.jpeg_quality)?
        };
        self.emit(ControllerEvent::FrameCaptured { bytes: frame.len() });
        Ok(frame)
    }

    fn apply_permission_update(&self, update: PermissionUpdate) {
        let previous = *self.permission.read();
        let permission = PermissionState::from_granted(update.granted);
        info!(granted = update.granted, "Camera permission update");
        self.set_permission(permission);

        if previous == PermissionState::Denied && permission == PermissionState::Granted {
            self.transition(ControllerState::Denied, ControllerState::Idle);
            self.set_status(StatusReport::success(PERMISSION_GRANTED_RETRY_MESSAGE));
        } else if let Some(error) = update.error.filter(|_| !update.granted) {
            self.set_status(StatusReport {
                message: error,
                kind: crate::StatusKind::Error,
                offer_permission_page: self.permission_page_available(),
            });
        }
    }
}

/// Puts a `start_camera` future dropped mid-acquisition back to `Idle`
struct StartGuard<'a> {
    inner: &'a Inner,
    armed: bool,
}

impl<'a> StartGuard<'a> {
    fn new(inner: &'a Inner) -> Self {
        Self { inner, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if self.armed
            && self
                .inner
                .transition(ControllerState::RequestingPermission, ControllerState::Idle)
        {
            warn!("Camera start abandoned before completing");
            self.inner.set_permission(PermissionState::Unknown);
            self.inner
                .set_status(StatusReport::info("Camera start cancelled"));
        }
    }
}

/// Drives camera acquisition, frame capture and analysis
///
/// All state lives behind short-lived locks; none is held across an await.
/// Dropping the controller stops the camera and the permission listener.
pub struct CaptureController {
    inner: Arc<Inner>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl CaptureController {
    /// Create a controller from its parts
    pub fn new(
        camera: Arc<dyn CameraDevice>,
        access: CameraAccess,
        analysis: Arc<dyn AnalysisService>,
        config: ControllerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                camera,
                access,
                analysis,
                config,
                state: RwLock::new(ControllerState::Idle),
                permission: RwLock::new(PermissionState::Unknown),
                status: RwLock::new(StatusReport::default()),
                session: Mutex::new(None),
                events,
            }),
            listener: Mutex::new(None),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ControllerState {
        *self.inner.state.read()
    }

    /// Current camera permission state
    pub fn permission(&self) -> PermissionState {
        *self.inner.permission.read()
    }

    /// Latest status line
    pub fn status(&self) -> StatusReport {
        self.inner.status.read().clone()
    }

    /// Camera access strategy
    pub fn access(&self) -> &CameraAccess {
        &self.inner.access
    }

    /// Subscribe to raw controller events
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.inner.events.subscribe()
    }

    /// Controller events as a stream
    pub fn events(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    /// Acquire the camera and start playback
    ///
    /// A start already in progress makes this a no-op. Starting while the
    /// camera is playing is rejected. From `Idle`, `Denied` or `Error` the
    /// full acquisition runs again.
    pub async fn start_camera(&self) -> ControllerResult<()> {
        let from = {
            let mut state = self.inner.state.write();
            match *state {
                ControllerState::RequestingPermission => {
                    debug!("Camera start already in progress");
                    return Ok(());
                }
                ControllerState::Active | ControllerState::Analyzing => {
                    return Err(ControllerError::InvalidState {
                        expected: ControllerState::Idle,
                        actual: *state,
                    });
                }
                current => {
                    *state = ControllerState::RequestingPermission;
                    current
                }
            }
        };
        let guard = StartGuard::new(&self.inner);
        self.inner.emit(ControllerEvent::StateChanged {
            from,
            to: ControllerState::RequestingPermission,
        });
        self.inner.set_permission(PermissionState::Requesting);
        self.inner
            .set_status(StatusReport::info("Requesting camera access..."));

        let outcome = self.acquire().await;
        guard.disarm();

        match outcome {
            Ok(session) => {
                let resolution = session.resolution();
                *self.inner.session.lock() = Some(session);
                self.inner.set_permission(PermissionState::Granted);
                self.inner.set_state(ControllerState::Active);
                self.inner.set_status(StatusReport::success(format!(
                    "Camera active ({}x{})",
                    resolution.width, resolution.height
                )));
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "Camera start failed");
                if error.is_permission_denied() {
                    self.inner.set_permission(PermissionState::Denied);
                    self.inner.set_state(ControllerState::Denied);
                } else {
                    self.inner.set_permission(PermissionState::Unknown);
                    self.inner.set_state(ControllerState::Error);
                }
                self.inner.report_failure(&error);
                Err(error)
            }
        }
    }

    async fn acquire(&self) -> ControllerResult<CaptureSession> {
        if let Some(relay) = self.inner.access.relay() {
            if relay.check_permission().await? {
                debug!("Camera permission already granted");
            } else {
                self.inner
                    .set_status(StatusReport::info("Requesting camera permission..."));
                if !relay.request_permission().await? {
                    return Err(MediaError::acquisition(
                        AcquisitionErrorKind::PermissionDenied,
                        "Camera permission was not granted",
                    )
                    .into());
                }
            }
        }

        let config = &self.inner.config;
        let session = CaptureSession::start(
            self.inner.camera.as_ref(),
            &config.constraints,
            config.metadata_timeout,
        )
        .await?;
        Ok(session)
    }

    /// Stop the camera. Does nothing when no session is live.
    pub fn stop_camera(&self) {
        let session = self.inner.session.lock().take();
        if let Some(mut session) = session {
            session.stop();
            self.inner.set_permission(PermissionState::Unknown);
            self.inner.set_state(ControllerState::Idle);
            self.inner.set_status(StatusReport::info("Camera stopped"));
        }
    }

    /// Encode the current frame as a JPEG data-URI
    ///
    /// Only allowed while the camera is `Active`.
    pub fn capture_frame(&self) -> ControllerResult<DataUri> {
        let state = self.state();
        if state != ControllerState::Active {
            return Err(ControllerError::InvalidState {
                expected: ControllerState::Active,
                actual: state,
            });
        }
        self.inner.grab_frame()
    }

    /// Capture a frame and submit it for analysis
    ///
    /// The controller is `Analyzing` for the duration and returns to `Active`
    /// afterwards, unless the camera was stopped meanwhile.
    pub async fn capture_and_analyze(&self) -> ControllerResult<AnalysisResult> {
        if !self
            .inner
            .transition(ControllerState::Active, ControllerState::Analyzing)
        {
            return Err(ControllerError::InvalidState {
                expected: ControllerState::Active,
                actual: self.state(),
            });
        }
        self.inner.set_status(StatusReport::info("Analyzing image..."));

        let outcome: ControllerResult<AnalysisResult> = async {
            let frame = self.inner.grab_frame()?;
            Ok(self.inner.analysis.analyze_image(&frame).await?)
        }
        .await;

        self.inner
            .transition(ControllerState::Analyzing, ControllerState::Active);
        self.finish_analysis(outcome)
    }

    /// Submit arbitrary media for verification
    pub async fn verify_media(&self, media: &DataUri) -> ControllerResult<AnalysisResult> {
        self.inner
            .set_status(StatusReport::info("Verifying media..."));
        let outcome = self
            .inner
            .analysis
            .verify_media(media)
            .await
            .map_err(ControllerError::from);
        self.finish_analysis(outcome)
    }

    /// Read a file and submit it for verification
    pub async fn verify_file(&self, path: impl AsRef<Path>) -> ControllerResult<AnalysisResult> {
        let media = match DataUri::from_file(path).await {
            Ok(media) => media,
            Err(e) => {
                let error = ControllerError::from(e);
                self.inner.report_failure(&error);
                return Err(error);
            }
        };
        self.verify_media(&media).await
    }

    fn finish_analysis(
        &self,
        outcome: ControllerResult<AnalysisResult>,
    ) -> ControllerResult<AnalysisResult> {
        match &outcome {
            Ok(result) => {
                info!(label = %result.label, confidence = result.confidence, "Analysis complete");
                self.inner.emit(ControllerEvent::AnalysisCompleted {
                    result: result.clone(),
                });
                self.inner
                    .set_status(StatusReport::success("Analysis complete"));
            }
            Err(error) => {
                warn!(error = %error, "Analysis failed");
                self.inner.emit(ControllerEvent::AnalysisFailed {
                    error: error.to_string(),
                });
                self.inner.report_failure(error);
            }
        }
        outcome
    }

    /// Follow permission pushes from the relay
    ///
    /// Returns `false` with direct access, where there is nothing to follow.
    /// Calling it again replaces the previous listener.
    pub fn spawn_permission_listener(&self) -> bool {
        let Some(relay) = self.inner.access.relay() else {
            return false;
        };
        let mut updates = relay.subscribe();
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(update) => match inner.upgrade() {
                        Some(inner) => inner.apply_permission_update(update),
                        None => break,
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Permission listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Permission listener stopped");
        });

        if let Some(previous) = self.listener.lock().replace(handle) {
            previous.abort();
        }
        true
    }
}

impl fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureController")
            .field("camera", &self.inner.camera.name())
            .field("access", &self.inner.access)
            .field("state", &self.state())
            .field("permission", &self.permission())
            .finish()
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.lock().take() {
            listener.abort();
        }
        if let Some(mut session) = self.inner.session.lock().take() {
            session.stop();
        }
    }
}
