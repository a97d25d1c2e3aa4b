//! Shutter Capture Session
//!
//! Coordinates the mutually exclusive states of a camera screen and mediates
//! every call to the device camera.
//!
//! # State machine
//!
//! ```text
//!            open                 capture_photo
//!   Idle ───────────▶ Viewfinder ─────────────▶ PreviewingPhoto
//!    ▲                 │  ▲  ▲                       │
//!    │                 │  │  └────── cancel_preview ─┤
//!    │     start_      │  │                          │
//!    │     recording   ▼  │ (no video)               │
//!    │             Recording ──────▶ PreviewingVideo ┘
//!    │                      stop_recording
//!    │
//!    └──────────────── close (from any state) ─────────────
//! ```
//!
//! Lens and flash can only change in the viewfinder. While an operation is
//! waiting on the device, every other operation except `close` is rejected
//! with [`SessionError::SessionBusy`].

pub mod error;
pub mod session;
pub mod state;

pub use error::{SessionError, SessionResult};
pub use session::{CaptureSession, SessionConfig};
pub use state::{Operation, SessionState};
