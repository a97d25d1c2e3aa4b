//! Capture session state machine.
//!
//! One session backs one camera screen. It owns the only copy of the screen
//! state and is the only caller of the device camera, so every transition is
//! checked against the current state before the device is touched.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use shutter_common::camera::{Artifact, Flash, Lens, PictureOptions};
use shutter_common::clock::RecordingClock;
use shutter_common::config::CaptureDefaults;
use shutter_common::error::{ShutterError, ShutterResult};
use shutter_device::{DeviceCamera, PendingRecording};

use crate::error::{SessionError, SessionResult};
use crate::state::{Operation, SessionState};

/// Configuration for a capture session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Options passed to every still capture.
    pub picture: PictureOptions,

    /// Upper bound for a single device call. `None` waits forever.
    pub operation_timeout: Option<Duration>,

    /// Upper bound for a stopped recording to hand over its file.
    pub finalize_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&CaptureDefaults::default())
    }
}

impl From<&CaptureDefaults> for SessionConfig {
    fn from(defaults: &CaptureDefaults) -> Self {
        Self {
            picture: defaults.picture.normalized(),
            operation_timeout: defaults.operation_timeout(),
            finalize_timeout: defaults.finalize_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settings {
    lens: Lens,
    flash: Flash,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Viewfinder,
    Recording {
        clock: RecordingClock,
        pending: Option<PendingRecording>,
    },
    PreviewingPhoto(Artifact),
    PreviewingVideo(Artifact),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Viewfinder => "viewfinder_active",
            Phase::Recording { .. } => "recording",
            Phase::PreviewingPhoto(_) => "previewing_photo",
            Phase::PreviewingVideo(_) => "previewing_video",
        }
    }
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    /// Survives preview so cancelling returns to the same viewfinder.
    settings: Settings,
    busy: bool,
    /// Bumped by every close; results from an older epoch are discarded.
    epoch: u64,
    cancel: CancellationToken,
}

impl Inner {
    fn snapshot(&self) -> SessionState {
        let Settings { lens, flash } = self.settings;
        match &self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::Viewfinder => SessionState::ViewfinderActive { lens, flash },
            Phase::Recording { clock, .. } => SessionState::Recording {
                lens,
                flash,
                started_at: clock.started_at(),
            },
            Phase::PreviewingPhoto(artifact) => SessionState::PreviewingPhoto {
                uri: artifact.uri.clone(),
            },
            Phase::PreviewingVideo(artifact) => SessionState::PreviewingVideo {
                uri: artifact.uri.clone(),
            },
        }
    }
}

/// Busy slot held by an in-flight operation. Released on drop unless a
/// close has started a new epoch in the meantime.
struct Ticket<'a> {
    inner: &'a Mutex<Inner>,
    epoch: u64,
    cancel: CancellationToken,
    settings: Settings,
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if inner.epoch == self.epoch {
            inner.busy = false;
        }
    }
}

enum CallFailure {
    Cancelled,
    TimedOut(Duration),
    Device(ShutterError),
}

async fn bounded<T, F>(limit: Option<Duration>, fut: F) -> Result<T, CallFailure>
where
    F: Future<Output = ShutterResult<T>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(CallFailure::Device),
            Err(_) => Err(CallFailure::TimedOut(limit)),
        },
        None => fut.await.map_err(CallFailure::Device),
    }
}

/// Run a device call, giving up as soon as the session is closed.
async fn guarded<T, F>(
    cancel: &CancellationToken,
    limit: Option<Duration>,
    fut: F,
) -> Result<T, CallFailure>
where
    F: Future<Output = ShutterResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CallFailure::Cancelled),
        result = bounded(limit, fut) => result,
    }
}

/// A camera screen session coordinating the device camera.
///
/// All methods take `&self`; share the session behind an [`Arc`] to issue a
/// [`CaptureSession::close`] while another operation is pending.
pub struct CaptureSession {
    device: Arc<dyn DeviceCamera>,
    config: SessionConfig,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<SessionState>,
}

impl CaptureSession {
    /// Create an idle session over `device`.
    pub fn new(device: Arc<dyn DeviceCamera>, config: SessionConfig) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            device,
            config,
            inner: Mutex::new(Inner {
                phase: Phase::Idle,
                settings: Settings {
                    lens: Lens::Back,
                    flash: Flash::Off,
                },
                busy: false,
                epoch: 0,
                cancel: CancellationToken::new(),
            }),
            state_tx,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.inner.lock().snapshot()
    }

    /// Receiver that observes every committed transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Whether an operation is waiting on the device.
    pub fn is_busy(&self) -> bool {
        self.inner.lock().busy
    }

    /// Time since the current recording started.
    pub fn recording_elapsed(&self) -> Option<Duration> {
        match &self.inner.lock().phase {
            Phase::Recording { clock, .. } => Some(clock.elapsed()),
            _ => None,
        }
    }

    /// Request permission and start the viewfinder.
    ///
    /// Valid only while idle. A denied permission leaves the session idle.
    pub async fn open(&self, lens: Lens, flash: Flash) -> SessionResult<SessionState> {
        let op = Operation::Open;
        let ticket = self.begin(op, |phase| matches!(phase, Phase::Idle))?;
        let limit = self.config.operation_timeout;

        tracing::info!(device = self.device.name(), %lens, %flash, "Opening capture session");

        let granted = guarded(&ticket.cancel, limit, self.device.request_permission())
            .await
            .map_err(|failure| self.fail(op, failure))?;
        if !granted {
            tracing::warn!("Camera permission denied");
            return Err(SessionError::PermissionDenied);
        }

        guarded(&ticket.cancel, limit, self.device.start_preview(lens, flash))
            .await
            .map_err(|failure| self.fail(op, failure))?;

        let state = self.commit(&ticket, op, |inner| {
            inner.phase = Phase::Viewfinder;
            inner.settings = Settings { lens, flash };
        })?;
        tracing::info!("Viewfinder active");
        Ok(state)
    }

    /// Switch between front and back lens.
    pub async fn toggle_lens(&self) -> SessionResult<Lens> {
        let op = Operation::ToggleLens;
        let ticket = self.begin(op, |phase| matches!(phase, Phase::Viewfinder))?;
        let next = Settings {
            lens: ticket.settings.lens.toggled(),
            ..ticket.settings
        };
        self.apply_settings(&ticket, op, next).await?;
        Ok(next.lens)
    }

    /// Switch flash on or off.
    pub async fn toggle_flash(&self) -> SessionResult<Flash> {
        let op = Operation::ToggleFlash;
        let ticket = self.begin(op, |phase| matches!(phase, Phase::Viewfinder))?;
        let next = Settings {
            flash: ticket.settings.flash.toggled(),
            ..ticket.settings
        };
        self.apply_settings(&ticket, op, next).await?;
        Ok(next.flash)
    }

    /// Take a still and freeze the viewfinder on it.
    pub async fn capture_photo(&self) -> SessionResult<Artifact> {
        let op = Operation::CapturePhoto;
        let ticket = self.begin(op, |phase| matches!(phase, Phase::Viewfinder))?;
        let limit = self.config.operation_timeout;
        let options = self.config.picture;

        tracing::debug!(?options, "Taking picture");
        let uri = guarded(&ticket.cancel, limit, self.device.take_picture(options))
            .await
            .map_err(|failure| self.fail(op, failure))?
            .ok_or_else(|| {
                tracing::warn!("Device returned no photo");
                SessionError::capture_failed("device returned no photo")
            })?;

        if let Err(failure) = guarded(&ticket.cancel, limit, self.device.pause_preview()).await {
            tracing::warn!(%uri, "Discarding picture: preview could not be paused");
            return Err(match self.fail(op, failure) {
                SessionError::CaptureFailed { reason } => {
                    SessionError::capture_failed(format!("{reason} (discarded {uri})"))
                }
                other => other,
            });
        }

        let artifact = Artifact::photo(uri);
        let previewed = artifact.clone();
        self.commit(&ticket, op, move |inner| {
            inner.phase = Phase::PreviewingPhoto(previewed);
        })?;
        tracing::info!(uri = %artifact.uri, "Picture taken");
        Ok(artifact)
    }

    /// Begin recording. Returns once the device has accepted the start;
    /// the recording itself runs until [`CaptureSession::stop_recording`].
    pub async fn start_recording(&self) -> SessionResult<SessionState> {
        let op = Operation::StartRecording;
        let ticket = self.begin(op, |phase| matches!(phase, Phase::Viewfinder))?;

        let pending = guarded(
            &ticket.cancel,
            self.config.operation_timeout,
            self.device.start_recording(),
        )
        .await
        .map_err(|failure| self.fail(op, failure))?;

        let clock = RecordingClock::start();
        let state = self.commit(&ticket, op, move |inner| {
            inner.phase = Phase::Recording {
                clock,
                pending: Some(pending),
            };
        })?;
        tracing::info!(started_at = %clock.started_at_rfc3339(), "Recording started");
        Ok(state)
    }

    /// Stop recording and preview the produced video.
    ///
    /// If the device finishes without a file the session returns to the
    /// viewfinder and reports `CaptureFailed`.
    pub async fn stop_recording(&self) -> SessionResult<Artifact> {
        let op = Operation::StopRecording;
        let ticket = self.begin(op, |phase| matches!(phase, Phase::Recording { .. }))?;

        guarded(
            &ticket.cancel,
            self.config.operation_timeout,
            self.device.stop_recording(),
        )
        .await
        .map_err(|failure| self.fail(op, failure))?;

        let (pending, duration_secs) = {
            let mut inner = self.inner.lock();
            if inner.epoch != ticket.epoch {
                return Err(SessionError::Closed { operation: op });
            }
            match &mut inner.phase {
                Phase::Recording { clock, pending } => (pending.take(), clock.elapsed_secs()),
                _ => (None, 0.0),
            }
        };
        let Some(pending) = pending else {
            return Err(SessionError::capture_failed("recording handle missing"));
        };

        match guarded(&ticket.cancel, self.config.finalize_timeout, pending.wait()).await {
            Ok(Some(uri)) => {
                let artifact = Artifact::video(uri);
                let previewed = artifact.clone();
                self.commit(&ticket, op, move |inner| {
                    inner.phase = Phase::PreviewingVideo(previewed);
                })?;
                tracing::info!(uri = %artifact.uri, duration_secs, "Video recorded");
                Ok(artifact)
            }
            Ok(None) => {
                self.commit(&ticket, op, |inner| inner.phase = Phase::Viewfinder)?;
                tracing::warn!(duration_secs, "Recording finished without a video");
                Err(SessionError::capture_failed("recording produced no video"))
            }
            Err(CallFailure::Cancelled) => Err(self.fail(op, CallFailure::Cancelled)),
            Err(failure) => {
                self.commit(&ticket, op, |inner| inner.phase = Phase::Viewfinder)?;
                Err(self.fail(op, failure))
            }
        }
    }

    /// Dismiss the previewed capture and resume the live viewfinder.
    pub async fn cancel_preview(&self) -> SessionResult<SessionState> {
        let op = Operation::CancelPreview;
        let ticket = self.begin(op, |phase| {
            matches!(phase, Phase::PreviewingPhoto(_) | Phase::PreviewingVideo(_))
        })?;

        guarded(
            &ticket.cancel,
            self.config.operation_timeout,
            self.device.resume_preview(),
        )
        .await
        .map_err(|failure| self.fail(op, failure))?;

        let state = self.commit(&ticket, op, |inner| inner.phase = Phase::Viewfinder)?;
        tracing::info!("Preview dismissed");
        Ok(state)
    }

    /// Return to idle and release the device.
    ///
    /// Valid from every state, including while another operation is
    /// pending: that operation resolves with `Closed` and its result is
    /// dropped. An active recording is stopped and its output discarded.
    /// Device failures here are logged, never returned.
    pub async fn close(&self) {
        let (previous, was_busy) = {
            let mut inner = self.inner.lock();
            let previous = std::mem::replace(&mut inner.phase, Phase::Idle);
            let was_busy = inner.busy;
            inner.busy = false;
            inner.epoch += 1;
            std::mem::replace(&mut inner.cancel, CancellationToken::new()).cancel();
            self.state_tx.send_replace(inner.snapshot());
            (previous, was_busy)
        };

        tracing::info!(from = previous.name(), was_busy, "Closing capture session");
        let limit = self.config.operation_timeout;

        if let Phase::Recording {
            pending: Some(pending),
            ..
        } = &previous
        {
            if let Err(failure) = bounded(limit, self.device.stop_recording()).await {
                self.log_close_failure("stop_recording", failure);
            }
            tracing::debug!(?pending, "Discarding in-flight recording");
        }

        if !matches!(previous, Phase::Idle) || was_busy {
            if let Err(failure) = bounded(limit, self.device.stop_preview()).await {
                self.log_close_failure("stop_preview", failure);
            }
        }

        if let Err(failure) = bounded(limit, self.device.release()).await {
            self.log_close_failure("release", failure);
        }

        drop(previous);
        tracing::info!("Capture session closed");
    }

    // Internal helpers

    /// Claim the busy slot for `operation` if the current phase allows it.
    fn begin(
        &self,
        operation: Operation,
        allowed: impl FnOnce(&Phase) -> bool,
    ) -> SessionResult<Ticket<'_>> {
        let mut inner = self.inner.lock();
        if inner.busy {
            tracing::debug!(%operation, "Rejected: session busy");
            return Err(SessionError::SessionBusy { operation });
        }
        if !allowed(&inner.phase) {
            let state = inner.phase.name();
            tracing::debug!(%operation, state, "Rejected: invalid transition");
            return Err(SessionError::InvalidTransition { operation, state });
        }
        inner.busy = true;
        Ok(Ticket {
            inner: &self.inner,
            epoch: inner.epoch,
            cancel: inner.cancel.clone(),
            settings: inner.settings,
        })
    }

    /// Apply a transition unless the session was closed since `ticket`
    /// was issued.
    fn commit(
        &self,
        ticket: &Ticket<'_>,
        operation: Operation,
        apply: impl FnOnce(&mut Inner),
    ) -> SessionResult<SessionState> {
        let mut inner = self.inner.lock();
        if inner.epoch != ticket.epoch {
            tracing::debug!(%operation, "Discarding result of operation from a closed session");
            return Err(SessionError::Closed { operation });
        }
        apply(&mut inner);
        let state = inner.snapshot();
        self.state_tx.send_replace(state.clone());
        Ok(state)
    }

    async fn apply_settings(
        &self,
        ticket: &Ticket<'_>,
        op: Operation,
        next: Settings,
    ) -> SessionResult<SessionState> {
        guarded(
            &ticket.cancel,
            self.config.operation_timeout,
            self.device.start_preview(next.lens, next.flash),
        )
        .await
        .map_err(|failure| self.fail(op, failure))?;

        let state = self.commit(ticket, op, |inner| inner.settings = next)?;
        tracing::info!(lens = %next.lens, flash = %next.flash, "Camera settings changed");
        Ok(state)
    }

    fn fail(&self, operation: Operation, failure: CallFailure) -> SessionError {
        match failure {
            CallFailure::Cancelled => {
                tracing::debug!(%operation, "Operation abandoned: session closed");
                SessionError::Closed { operation }
            }
            CallFailure::TimedOut(limit) => {
                tracing::warn!(%operation, timeout_ms = limit.as_millis() as u64, "Device call timed out");
                SessionError::capture_failed(format!(
                    "{operation} timed out after {}ms",
                    limit.as_millis()
                ))
            }
            CallFailure::Device(error) => {
                tracing::warn!(%operation, error = %error, "Device call failed");
                SessionError::from_device(error)
            }
        }
    }

    fn log_close_failure(&self, call: &str, failure: CallFailure) {
        match failure {
            CallFailure::TimedOut(limit) => {
                tracing::warn!(call, timeout_ms = limit.as_millis() as u64, "Device call timed out during close")
            }
            CallFailure::Device(error) => {
                tracing::warn!(call, error = %error, "Device call failed during close")
            }
            CallFailure::Cancelled => {}
        }
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("device", &self.device.name())
            .field("config", &self.config)
            .field("inner", &*self.inner.lock())
            .finish()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        inner.cancel.cancel();
        if !matches!(inner.phase, Phase::Idle) {
            tracing::warn!(
                state = inner.phase.name(),
                "Capture session dropped without close; device not released"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shutter_device::{
        DeviceCall, PictureOutcome, RecordingOutcome, RecordingStart, SimulatedCamera,
    };

    fn session_with(camera: &Arc<SimulatedCamera>) -> CaptureSession {
        CaptureSession::new(camera.clone(), SessionConfig::default())
    }

    async fn wait_until_busy(session: &CaptureSession) {
        while !session.is_busy() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_open_starts_viewfinder() {
        let camera = Arc::new(SimulatedCamera::default());
        let session = session_with(&camera);

        let state = session.open(Lens::Front, Flash::On).await.unwrap();
        assert_eq!(
            state,
            SessionState::ViewfinderActive {
                lens: Lens::Front,
                flash: Flash::On
            }
        );
        assert_eq!(
            camera.calls(),
            vec![
                DeviceCall::RequestPermission,
                DeviceCall::StartPreview {
                    lens: Lens::Front,
                    flash: Flash::On
                },
            ]
        );
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_permission_denied_stays_idle() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_permission(false);
        let session = session_with(&camera);

        let err = session.open(Lens::Back, Flash::Off).await.unwrap_err();
        assert_eq!(err, SessionError::PermissionDenied);
        assert!(err.is_user_facing());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!camera.is_previewing());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_open_twice_is_invalid() {
        let camera = Arc::new(SimulatedCamera::default());
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();

        let err = session.open(Lens::Front, Flash::Off).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                operation: Operation::Open,
                state: "viewfinder_active"
            }
        );
    }

    #[tokio::test]
    async fn test_toggle_lens_twice_returns_to_back() {
        let camera = Arc::new(SimulatedCamera::default());
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();

        assert_eq!(session.toggle_lens().await.unwrap(), Lens::Front);
        assert_eq!(session.toggle_lens().await.unwrap(), Lens::Back);
        assert_eq!(
            session.state(),
            SessionState::ViewfinderActive {
                lens: Lens::Back,
                flash: Flash::Off
            }
        );
    }

    #[tokio::test]
    async fn test_failed_preview_restart_keeps_settings() {
        let camera = Arc::new(SimulatedCamera::default());
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();
        camera.set_fail_preview_restart(true);

        let err = session.toggle_flash().await.unwrap_err();
        assert!(matches!(err, SessionError::CaptureFailed { .. }));
        assert_eq!(
            session.state(),
            SessionState::ViewfinderActive {
                lens: Lens::Back,
                flash: Flash::Off
            }
        );
    }

    #[tokio::test]
    async fn test_capture_without_artifact_leaves_viewfinder() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_picture_outcome(PictureOutcome::NoArtifact);
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();

        let err = session.capture_photo().await.unwrap_err();
        assert_eq!(err, SessionError::capture_failed("device returned no photo"));
        assert!(matches!(
            session.state(),
            SessionState::ViewfinderActive { .. }
        ));
        assert!(!camera.calls().contains(&DeviceCall::PausePreview));
    }

    #[tokio::test]
    async fn test_capture_rejection_is_capture_failed() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_picture_outcome(PictureOutcome::Reject("sensor error".into()));
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();

        let err = session.capture_photo().await.unwrap_err();
        assert_eq!(
            err,
            SessionError::capture_failed("Device error: sensor error")
        );
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_capture_pauses_preview_and_passes_options() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_picture_outcome(PictureOutcome::Artifact("file://p.jpg".into()));
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();

        let artifact = session.capture_photo().await.unwrap();
        assert_eq!(artifact, Artifact::photo("file://p.jpg"));
        let calls = camera.calls();
        assert!(calls.contains(&DeviceCall::TakePicture(PictureOptions::default())));
        assert_eq!(calls.last(), Some(&DeviceCall::PausePreview));
    }

    #[tokio::test]
    async fn test_failed_pause_reports_discarded_photo() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_picture_outcome(PictureOutcome::Artifact("file://orphan.jpg".into()));
        camera.set_fail_pause(true);
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();

        let err = session.capture_photo().await.unwrap_err();
        assert_eq!(
            err,
            SessionError::capture_failed(
                "Device error: preview pause failed (discarded file://orphan.jpg)"
            )
        );
        assert!(matches!(
            session.state(),
            SessionState::ViewfinderActive { .. }
        ));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_busy_guard_rejects_concurrent_operations() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_picture_delay(Some(Duration::from_millis(100)));
        let session = Arc::new(session_with(&camera));
        session.open(Lens::Back, Flash::Off).await.unwrap();

        let capture = tokio::spawn({
            let session = session.clone();
            async move { session.capture_photo().await }
        });
        wait_until_busy(&session).await;

        assert_eq!(
            session.toggle_lens().await.unwrap_err(),
            SessionError::SessionBusy {
                operation: Operation::ToggleLens
            }
        );
        assert_eq!(
            session.start_recording().await.unwrap_err(),
            SessionError::SessionBusy {
                operation: Operation::StartRecording
            }
        );

        capture.await.unwrap().unwrap();
        assert!(!session.is_busy());
        assert!(session.state().is_previewing());
    }

    #[tokio::test]
    async fn test_dropped_operation_releases_busy_slot() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_picture_outcome(PictureOutcome::Hang);
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();

        let timed = tokio::time::timeout(Duration::from_millis(20), session.capture_photo()).await;
        assert!(timed.is_err());
        assert!(!session.is_busy());
        assert_eq!(session.toggle_flash().await.unwrap(), Flash::On);
    }

    #[tokio::test]
    async fn test_operation_timeout_is_capture_failed() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_picture_outcome(PictureOutcome::Hang);
        let session = CaptureSession::new(
            camera.clone(),
            SessionConfig {
                operation_timeout: Some(Duration::from_millis(30)),
                ..SessionConfig::default()
            },
        );
        session.open(Lens::Back, Flash::Off).await.unwrap();

        let err = session.capture_photo().await.unwrap_err();
        assert_eq!(
            err,
            SessionError::capture_failed("capture_photo timed out after 30ms")
        );
        assert!(matches!(
            session.state(),
            SessionState::ViewfinderActive { .. }
        ));
    }

    #[tokio::test]
    async fn test_start_rejection_stays_in_viewfinder() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_recording_start(RecordingStart::Reject("no storage".into()));
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();

        let err = session.start_recording().await.unwrap_err();
        assert!(matches!(err, SessionError::CaptureFailed { .. }));
        assert!(matches!(
            session.state(),
            SessionState::ViewfinderActive { .. }
        ));
        assert_eq!(session.recording_elapsed(), None);
    }

    #[tokio::test]
    async fn test_recording_without_video_returns_to_viewfinder() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_recording_outcome(RecordingOutcome::NoArtifact);
        let session = session_with(&camera);
        session.open(Lens::Front, Flash::On).await.unwrap();
        session.start_recording().await.unwrap();
        assert!(session.recording_elapsed().is_some());

        let err = session.stop_recording().await.unwrap_err();
        assert_eq!(err, SessionError::capture_failed("recording produced no video"));
        assert_eq!(
            session.state(),
            SessionState::ViewfinderActive {
                lens: Lens::Front,
                flash: Flash::On
            }
        );
    }

    #[tokio::test]
    async fn test_recording_rejection_returns_to_viewfinder() {
        let camera = Arc::new(SimulatedCamera::default());
        camera.set_recording_outcome(RecordingOutcome::Reject("muxer failed".into()));
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();
        session.start_recording().await.unwrap();

        let err = session.stop_recording().await.unwrap_err();
        assert_eq!(err, SessionError::capture_failed("Device error: muxer failed"));
        assert!(matches!(
            session.state(),
            SessionState::ViewfinderActive { .. }
        ));
    }

    #[tokio::test]
    async fn test_lens_and_flash_locked_while_recording() {
        let camera = Arc::new(SimulatedCamera::default());
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();
        session.start_recording().await.unwrap();

        for err in [
            session.toggle_lens().await.map(|_| ()).unwrap_err(),
            session.toggle_flash().await.map(|_| ()).unwrap_err(),
        ] {
            assert!(matches!(
                err,
                SessionError::InvalidTransition {
                    state: "recording",
                    ..
                }
            ));
        }
    }

    #[tokio::test]
    async fn test_close_mid_recording_stops_and_releases() {
        let camera = Arc::new(SimulatedCamera::default());
        let session = session_with(&camera);
        session.open(Lens::Back, Flash::Off).await.unwrap();
        session.start_recording().await.unwrap();

        session.close().await;
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!camera.is_recording());
        assert!(!camera.is_previewing());
        let calls = camera.calls();
        let tail = &calls[calls.len() - 3..];
        assert_eq!(
            tail,
            &[
                DeviceCall::StopRecording,
                DeviceCall::StopPreview,
                DeviceCall::Release
            ]
        );
    }

    #[tokio::test]
    async fn test_close_from_idle_only_releases() {
        let camera = Arc::new(SimulatedCamera::default());
        let session = session_with(&camera);
        session.close().await;
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(camera.calls(), vec![DeviceCall::Release]);
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let camera = Arc::new(SimulatedCamera::default());
        let session = session_with(&camera);
        let mut rx = session.subscribe();

        session.open(Lens::Back, Flash::Off).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(matches!(
            *rx.borrow_and_update(),
            SessionState::ViewfinderActive { .. }
        ));

        session.close().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::Idle);
    }

    #[test]
    fn test_session_config_from_defaults() {
        let defaults = CaptureDefaults {
            operation_timeout_ms: None,
            picture: PictureOptions {
                quality: 7.0,
                ..PictureOptions::default()
            },
            ..CaptureDefaults::default()
        };
        let config = SessionConfig::from(&defaults);
        assert_eq!(config.operation_timeout, None);
        assert!((config.picture.quality - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.finalize_timeout, Some(Duration::from_secs(30)));
    }
}
