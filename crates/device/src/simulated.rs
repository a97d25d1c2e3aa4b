//! A scriptable in-process camera.
//!
//! Used by the CLI when no hardware binding is available and by tests that
//! need precise control over what the device answers. Every call is
//! appended to a log so callers can assert on the exact device traffic.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;

use shutter_common::camera::{ArtifactKind, Flash, Lens, PictureOptions};
use shutter_common::error::{ShutterError, ShutterResult};

use crate::recording::{recording_channel, PendingRecording, RecordingCompleter};
use crate::DeviceCamera;

/// What `take_picture` answers.
#[derive(Debug, Clone, PartialEq)]
pub enum PictureOutcome {
    /// Return this uri.
    Artifact(String),
    /// Return a fresh uri under the capture directory.
    Generated,
    /// Resolve without a file.
    NoArtifact,
    /// Fail with this message.
    Reject(String),
    /// Never resolve.
    Hang,
}

/// How `start_recording` reacts.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingStart {
    Accept,
    Reject(String),
    Hang,
}

/// What an accepted recording resolves with once stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingOutcome {
    Artifact(String),
    Generated,
    NoArtifact,
    Reject(String),
    /// Accept the stop but never hand over the file.
    Hang,
}

/// One observed device call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    RequestPermission,
    StartPreview { lens: Lens, flash: Flash },
    StopPreview,
    PausePreview,
    ResumePreview,
    TakePicture(PictureOptions),
    StartRecording,
    StopRecording,
    Release,
}

/// Initial behavior of a [`SimulatedCamera`].
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    pub permission_granted: bool,
    pub picture: PictureOutcome,
    pub recording_start: RecordingStart,
    pub recording_result: RecordingOutcome,
    /// Artificial latency before `take_picture` answers.
    pub picture_delay: Option<Duration>,
    /// Make `start_preview` fail (after the initial open).
    pub fail_preview_restart: bool,
    /// Refuse `stop_recording` with this message; the recording keeps running.
    pub stop_rejection: Option<String>,
    /// Make `pause_preview` fail.
    pub fail_pause: bool,
    /// Directory for generated uris.
    pub capture_dir: PathBuf,
    /// Write placeholder files for generated uris.
    pub materialize: bool,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            permission_granted: true,
            picture: PictureOutcome::Generated,
            recording_start: RecordingStart::Accept,
            recording_result: RecordingOutcome::Generated,
            picture_delay: None,
            fail_preview_restart: false,
            stop_rejection: None,
            fail_pause: false,
            capture_dir: std::env::temp_dir().join("shutter"),
            materialize: false,
        }
    }
}

#[derive(Debug, Default)]
struct DeviceState {
    previewing: bool,
    active_recording: Option<RecordingCompleter>,
    /// Stopped recordings that never finalize.
    stalled: Vec<RecordingCompleter>,
    calls: Vec<DeviceCall>,
    captures: u64,
}

/// In-process [`DeviceCamera`] with scripted answers.
#[derive(Debug)]
pub struct SimulatedCamera {
    config: Mutex<SimulatedConfig>,
    state: Mutex<DeviceState>,
}

impl SimulatedCamera {
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            config: Mutex::new(config),
            state: Mutex::new(DeviceState::default()),
        }
    }

    pub fn set_permission(&self, granted: bool) {
        self.config.lock().permission_granted = granted;
    }

    pub fn set_picture_outcome(&self, outcome: PictureOutcome) {
        self.config.lock().picture = outcome;
    }

    pub fn set_recording_start(&self, start: RecordingStart) {
        self.config.lock().recording_start = start;
    }

    pub fn set_recording_outcome(&self, outcome: RecordingOutcome) {
        self.config.lock().recording_result = outcome;
    }

    pub fn set_picture_delay(&self, delay: Option<Duration>) {
        self.config.lock().picture_delay = delay;
    }

    pub fn set_fail_preview_restart(&self, fail: bool) {
        self.config.lock().fail_preview_restart = fail;
    }

    pub fn set_stop_rejection(&self, message: Option<String>) {
        self.config.lock().stop_rejection = message;
    }

    pub fn set_fail_pause(&self, fail: bool) {
        self.config.lock().fail_pause = fail;
    }

    /// Snapshot of every call made so far.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.lock().calls.clone()
    }

    /// Whether the viewfinder is currently running.
    pub fn is_previewing(&self) -> bool {
        self.state.lock().previewing
    }

    /// Whether a recording has been accepted and not yet stopped.
    pub fn is_recording(&self) -> bool {
        self.state.lock().active_recording.is_some()
    }

    fn record(&self, call: DeviceCall) {
        tracing::trace!(?call, "Simulated device call");
        self.state.lock().calls.push(call);
    }

    fn generate_uri(&self, kind: ArtifactKind) -> ShutterResult<String> {
        let (dir, materialize) = {
            let config = self.config.lock();
            (config.capture_dir.clone(), config.materialize)
        };
        let seq = {
            let mut state = self.state.lock();
            state.captures += 1;
            state.captures
        };
        let (prefix, ext) = match kind {
            ArtifactKind::Photo => ("IMG", "jpg"),
            ArtifactKind::Video => ("VID", "mp4"),
        };
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{prefix}_{stamp}_{seq:04}.{ext}"));

        if materialize {
            std::fs::create_dir_all(&dir)?;
            std::fs::write(&path, format!("simulated {kind} #{seq}\n"))?;
        }
        Ok(format!("file://{}", path.display()))
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new(SimulatedConfig::default())
    }
}

#[async_trait::async_trait]
impl DeviceCamera for SimulatedCamera {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn request_permission(&self) -> ShutterResult<bool> {
        self.record(DeviceCall::RequestPermission);
        Ok(self.config.lock().permission_granted)
    }

    async fn start_preview(&self, lens: Lens, flash: Flash) -> ShutterResult<()> {
        self.record(DeviceCall::StartPreview { lens, flash });
        let restart = self.state.lock().previewing;
        if restart && self.config.lock().fail_preview_restart {
            return Err(ShutterError::device("preview restart failed"));
        }
        self.state.lock().previewing = true;
        Ok(())
    }

    async fn stop_preview(&self) -> ShutterResult<()> {
        self.record(DeviceCall::StopPreview);
        self.state.lock().previewing = false;
        Ok(())
    }

    async fn pause_preview(&self) -> ShutterResult<()> {
        self.record(DeviceCall::PausePreview);
        if self.config.lock().fail_pause {
            return Err(ShutterError::device("preview pause failed"));
        }
        Ok(())
    }

    async fn resume_preview(&self) -> ShutterResult<()> {
        self.record(DeviceCall::ResumePreview);
        Ok(())
    }

    async fn take_picture(&self, options: PictureOptions) -> ShutterResult<Option<String>> {
        self.record(DeviceCall::TakePicture(options));
        let (outcome, delay) = {
            let config = self.config.lock();
            (config.picture.clone(), config.picture_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match outcome {
            PictureOutcome::Artifact(uri) => Ok(Some(uri)),
            PictureOutcome::Generated => self.generate_uri(ArtifactKind::Photo).map(Some),
            PictureOutcome::NoArtifact => Ok(None),
            PictureOutcome::Reject(message) => Err(ShutterError::device(message)),
            PictureOutcome::Hang => std::future::pending().await,
        }
    }

    async fn start_recording(&self) -> ShutterResult<PendingRecording> {
        self.record(DeviceCall::StartRecording);
        let start = self.config.lock().recording_start.clone();
        match start {
            RecordingStart::Accept => {
                let (completer, pending) = recording_channel();
                self.state.lock().active_recording = Some(completer);
                Ok(pending)
            }
            RecordingStart::Reject(message) => Err(ShutterError::device(message)),
            RecordingStart::Hang => std::future::pending().await,
        }
    }

    async fn stop_recording(&self) -> ShutterResult<()> {
        self.record(DeviceCall::StopRecording);
        let (rejection, outcome) = {
            let config = self.config.lock();
            (config.stop_rejection.clone(), config.recording_result.clone())
        };
        if !self.is_recording() {
            return Err(ShutterError::device("no active recording"));
        }
        if let Some(message) = rejection {
            return Err(ShutterError::device(message));
        }

        // Produce the file before the recording is handed off so a failed
        // write leaves it stoppable.
        let uri = match &outcome {
            RecordingOutcome::Artifact(uri) => Some(uri.clone()),
            RecordingOutcome::Generated => Some(self.generate_uri(ArtifactKind::Video)?),
            _ => None,
        };

        let mut state = self.state.lock();
        let completer = state
            .active_recording
            .take()
            .ok_or_else(|| ShutterError::device("no active recording"))?;
        match outcome {
            RecordingOutcome::Reject(message) => {
                completer.fail(ShutterError::device(message));
            }
            RecordingOutcome::Hang => state.stalled.push(completer),
            _ => {
                completer.finish(uri);
            }
        }
        Ok(())
    }

    async fn release(&self) -> ShutterResult<()> {
        self.record(DeviceCall::Release);
        let mut state = self.state.lock();
        state.previewing = false;
        // Dropping the completer resolves any abandoned recording as empty.
        state.active_recording = None;
        state.stalled.clear();
        Ok(())
    }
}
