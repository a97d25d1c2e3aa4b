use std::sync::Arc;

use proptest::prelude::*;
use shutter_device::{Flash, Lens, SimulatedCamera};
use shutter_session::{CaptureSession, Operation, SessionConfig, SessionError, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Idle,
    Viewfinder,
    Recording,
    PhotoPreview,
    VideoPreview,
}

fn kind_of(state: &SessionState) -> Kind {
    match state {
        SessionState::Idle => Kind::Idle,
        SessionState::ViewfinderActive { .. } => Kind::Viewfinder,
        SessionState::Recording { .. } => Kind::Recording,
        SessionState::PreviewingPhoto { .. } => Kind::PhotoPreview,
        SessionState::PreviewingVideo { .. } => Kind::VideoPreview,
    }
}

/// The transition table. `None` means the operation is rejected.
fn expected(kind: Kind, op: Operation) -> Option<Kind> {
    use Kind::*;
    match (kind, op) {
        (_, Operation::Close) => Some(Idle),
        (Idle, Operation::Open) => Some(Viewfinder),
        (Viewfinder, Operation::ToggleLens | Operation::ToggleFlash) => Some(Viewfinder),
        (Viewfinder, Operation::CapturePhoto) => Some(PhotoPreview),
        (Viewfinder, Operation::StartRecording) => Some(Recording),
        (Recording, Operation::StopRecording) => Some(VideoPreview),
        (PhotoPreview | VideoPreview, Operation::CancelPreview) => Some(Viewfinder),
        _ => None,
    }
}

async fn apply(session: &CaptureSession, op: Operation) -> Result<(), SessionError> {
    match op {
        Operation::Open => session.open(Lens::Back, Flash::Off).await.map(|_| ()),
        Operation::ToggleLens => session.toggle_lens().await.map(|_| ()),
        Operation::ToggleFlash => session.toggle_flash().await.map(|_| ()),
        Operation::CapturePhoto => session.capture_photo().await.map(|_| ()),
        Operation::StartRecording => session.start_recording().await.map(|_| ()),
        Operation::StopRecording => session.stop_recording().await.map(|_| ()),
        Operation::CancelPreview => session.cancel_preview().await.map(|_| ()),
        Operation::Close => {
            session.close().await;
            Ok(())
        }
    }
}

fn operation() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_operation_follows_the_transition_table(ops in prop::collection::vec(operation(), 0..24)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let camera = Arc::new(SimulatedCamera::default());
            let session = CaptureSession::new(camera.clone(), SessionConfig::default());
            let (mut lens, mut flash) = (Lens::Back, Flash::Off);

            for op in ops {
                let before = session.state();
                let result = apply(&session, op).await;
                let after = session.state();

                match (expected(kind_of(&before), op), result) {
                    (Some(next), Ok(())) => {
                        prop_assert_eq!(kind_of(&after), next);
                        match op {
                            Operation::Open => (lens, flash) = (Lens::Back, Flash::Off),
                            Operation::ToggleLens => lens = lens.toggled(),
                            Operation::ToggleFlash => flash = flash.toggled(),
                            _ => {}
                        }
                        if next == Kind::Viewfinder {
                            prop_assert_eq!(after, SessionState::ViewfinderActive { lens, flash });
                        }
                    }
                    (None, Err(err)) => {
                        prop_assert_eq!(
                            err,
                            SessionError::InvalidTransition { operation: op, state: before.name() }
                        );
                        prop_assert_eq!(after, before);
                    }
                    (expectation, result) => {
                        prop_assert!(
                            false,
                            "{} from {}: expected {:?}, got {:?}",
                            op,
                            before.name(),
                            expectation,
                            result
                        );
                    }
                }
                prop_assert!(!session.is_busy());
            }

            session.close().await;
            prop_assert_eq!(session.state(), SessionState::Idle);
            prop_assert!(!camera.is_previewing());
            Ok(())
        })?;
    }
}
