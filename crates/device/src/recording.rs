//! Handle for a long-lived recording.

use tokio::sync::oneshot;

use shutter_common::error::{ShutterError, ShutterResult};

/// Device side of a recording: resolves the paired [`PendingRecording`].
#[derive(Debug)]
pub struct RecordingCompleter {
    tx: oneshot::Sender<ShutterResult<Option<String>>>,
}

/// Session side of a recording. Awaiting it yields the produced file, if any.
#[derive(Debug)]
pub struct PendingRecording {
    rx: oneshot::Receiver<ShutterResult<Option<String>>>,
}

/// Create a linked completer/handle pair.
pub fn recording_channel() -> (RecordingCompleter, PendingRecording) {
    let (tx, rx) = oneshot::channel();
    (RecordingCompleter { tx }, PendingRecording { rx })
}

impl RecordingCompleter {
    /// Resolve the recording with its output. Returns `false` if the handle
    /// was already dropped.
    pub fn finish(self, uri: Option<String>) -> bool {
        self.tx.send(Ok(uri)).is_ok()
    }

    /// Reject the recording.
    pub fn fail(self, error: ShutterError) -> bool {
        self.tx.send(Err(error)).is_ok()
    }
}

impl PendingRecording {
    /// Wait for the recording to resolve. A completer dropped without
    /// resolving counts as a recording with no output.
    pub async fn wait(self) -> ShutterResult<Option<String>> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Recording completer dropped without a result");
                Ok(None)
            }
        }
    }
}
