//! Clock utilities for recordings.
//!
//! A recording is anchored to a monotonic epoch taken when the device
//! accepts the start request. The wall-clock time at that epoch is kept
//! alongside for display and metadata.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// A recording clock that provides monotonic elapsed time relative to
/// a fixed epoch (the moment recording started).
#[derive(Debug, Clone, Copy)]
pub struct RecordingClock {
    /// The instant recording started.
    epoch: Instant,

    /// Wall-clock time at epoch.
    started_at: DateTime<Utc>,
}

impl RecordingClock {
    /// Create a new recording clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Time elapsed since recording start.
    pub fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Seconds elapsed since recording start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at recording start.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// RFC 3339 rendering of the start time.
    pub fn started_at_rfc3339(&self) -> String {
        self.started_at.to_rfc3339()
    }
}

/// Format a duration as `MM:SS` for recording indicators.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
