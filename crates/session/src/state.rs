//! Observable session state and the operations that drive it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use shutter_common::camera::{Flash, Lens};

/// Snapshot of a capture session.
///
/// Exactly one variant is active at a time. Lens and flash are only part of
/// the live states; a previewed capture carries nothing but its uri.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Screen closed or not yet opened.
    Idle,
    /// Live viewfinder.
    ViewfinderActive { lens: Lens, flash: Flash },
    /// Video recording in progress.
    Recording {
        lens: Lens,
        flash: Flash,
        started_at: DateTime<Utc>,
    },
    /// A just-taken photo awaiting accept/cancel.
    PreviewingPhoto { uri: String },
    /// A just-recorded video awaiting accept/cancel.
    PreviewingVideo { uri: String },
}

impl SessionState {
    /// Short state name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::ViewfinderActive { .. } => "viewfinder_active",
            SessionState::Recording { .. } => "recording",
            SessionState::PreviewingPhoto { .. } => "previewing_photo",
            SessionState::PreviewingVideo { .. } => "previewing_video",
        }
    }

    pub fn is_previewing(&self) -> bool {
        matches!(
            self,
            SessionState::PreviewingPhoto { .. } | SessionState::PreviewingVideo { .. }
        )
    }

    /// Uri of the capture under review, if any.
    pub fn preview_uri(&self) -> Option<&str> {
        match self {
            SessionState::PreviewingPhoto { uri } | SessionState::PreviewingVideo { uri } => {
                Some(uri)
            }
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::ViewfinderActive { lens, flash } => {
                write!(f, "viewfinder (lens: {lens}, flash: {flash})")
            }
            SessionState::Recording {
                lens,
                flash,
                started_at,
            } => write!(
                f,
                "recording since {} (lens: {lens}, flash: {flash})",
                started_at.to_rfc3339()
            ),
            SessionState::PreviewingPhoto { uri } => write!(f, "previewing photo {uri}"),
            SessionState::PreviewingVideo { uri } => write!(f, "previewing video {uri}"),
        }
    }
}

/// A session operation, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    ToggleLens,
    ToggleFlash,
    CapturePhoto,
    StartRecording,
    StopRecording,
    CancelPreview,
    Close,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Open,
        Operation::ToggleLens,
        Operation::ToggleFlash,
        Operation::CapturePhoto,
        Operation::StartRecording,
        Operation::StopRecording,
        Operation::CancelPreview,
        Operation::Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Open => "open",
            Operation::ToggleLens => "toggle_lens",
            Operation::ToggleFlash => "toggle_flash",
            Operation::CapturePhoto => "capture_photo",
            Operation::StartRecording => "start_recording",
            Operation::StopRecording => "stop_recording",
            Operation::CancelPreview => "cancel_preview",
            Operation::Close => "close",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
