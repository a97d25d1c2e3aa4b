//! Shutter device-camera contract.
//!
//! The capture session never touches camera hardware directly. Everything it
//! needs from the platform camera (permission, live preview, still capture,
//! recording) goes through [`DeviceCamera`], so platform bindings and test
//! doubles plug in behind the same seam.

pub mod recording;
pub mod simulated;

pub use recording::{recording_channel, PendingRecording, RecordingCompleter};
pub use shutter_common::camera::{Artifact, ArtifactKind, Flash, Lens, PictureOptions};
pub use simulated::{
    DeviceCall, PictureOutcome, RecordingOutcome, RecordingStart, SimulatedCamera,
    SimulatedConfig,
};

use shutter_common::error::ShutterResult;

/// Abstract interface to a platform camera.
///
/// Calls are issued by a single capture session; implementations do not need
/// to handle interleaved use by several sessions.
#[async_trait::async_trait]
pub trait DeviceCamera: Send + Sync {
    /// Human-readable device name for logs.
    fn name(&self) -> &str;

    /// Ask for camera (and microphone) access. `Ok(false)` means denied.
    async fn request_permission(&self) -> ShutterResult<bool>;

    /// Start the live viewfinder with the given settings. Calling it again
    /// while running applies new settings.
    async fn start_preview(&self, lens: Lens, flash: Flash) -> ShutterResult<()>;

    /// Stop the live viewfinder.
    async fn stop_preview(&self) -> ShutterResult<()>;

    /// Freeze the live viewfinder on its current frame.
    async fn pause_preview(&self) -> ShutterResult<()>;

    /// Resume a paused viewfinder.
    async fn resume_preview(&self) -> ShutterResult<()>;

    /// Capture a still. `Ok(None)` means the device produced no file.
    async fn take_picture(&self, options: PictureOptions) -> ShutterResult<Option<String>>;

    /// Begin recording. Returns once the device has accepted the request;
    /// the returned handle resolves when [`DeviceCamera::stop_recording`]
    /// is called.
    async fn start_recording(&self) -> ShutterResult<PendingRecording>;

    /// Signal the active recording to finish.
    async fn stop_recording(&self) -> ShutterResult<()>;

    /// Release hardware resources held by the device.
    async fn release(&self) -> ShutterResult<()> {
        Ok(())
    }
}
