//! Errors returned by capture session operations.

use shutter_common::error::ShutterError;

use crate::state::Operation;

/// Why a session operation did not apply.
///
/// A failed operation never changes the session state, except that a
/// recording which stops without producing a file falls back to the
/// viewfinder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        operation: Operation,
        state: &'static str,
    },

    #[error("Cannot {operation}: another camera operation is in progress")]
    SessionBusy { operation: Operation },

    #[error("Capture failed: {reason}")]
    CaptureFailed { reason: String },

    #[error("Session closed before {operation} completed")]
    Closed { operation: Operation },
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    pub fn capture_failed(reason: impl Into<String>) -> Self {
        Self::CaptureFailed {
            reason: reason.into(),
        }
    }

    /// Errors the end user must see. The rest are caller-contract
    /// conditions a screen can ignore or show as a no-op.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            SessionError::PermissionDenied | SessionError::CaptureFailed { .. }
        )
    }

    pub(crate) fn from_device(error: ShutterError) -> Self {
        match error {
            ShutterError::PermissionDenied { .. } => SessionError::PermissionDenied,
            other => SessionError::capture_failed(other.to_string()),
        }
    }
}
