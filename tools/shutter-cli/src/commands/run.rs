//! Drive a capture session from stdin or a script.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use shutter_common::camera::{ArtifactKind, Flash, Lens};
use shutter_common::clock::format_elapsed;
use shutter_common::config::AppConfig;
use shutter_device::{SimulatedCamera, SimulatedConfig};
use shutter_gallery::{ArtifactStore, GalleryStore};
use shutter_session::{CaptureSession, SessionConfig, SessionError, SessionState};

pub struct RunOptions {
    pub lens: Option<Lens>,
    pub flash: Option<Flash>,
    pub script: Option<PathBuf>,
    pub auto_save: bool,
    pub deny_permission: bool,
}

/// One line of screen input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenCommand {
    ToggleLens,
    ToggleFlash,
    Photo,
    Record,
    Stop,
    Cancel,
    Save,
    State,
    Close,
    Help,
}

impl FromStr for ScreenCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lens" | "flip" => Ok(ScreenCommand::ToggleLens),
            "flash" => Ok(ScreenCommand::ToggleFlash),
            "photo" | "snap" => Ok(ScreenCommand::Photo),
            "record" => Ok(ScreenCommand::Record),
            "stop" => Ok(ScreenCommand::Stop),
            "cancel" => Ok(ScreenCommand::Cancel),
            "save" => Ok(ScreenCommand::Save),
            "state" | "status" => Ok(ScreenCommand::State),
            "close" | "quit" | "exit" => Ok(ScreenCommand::Close),
            "help" | "?" => Ok(ScreenCommand::Help),
            other => Err(format!("Unknown command '{other}' (try 'help')")),
        }
    }
}

/// The last capture copied into the gallery, keyed by its transient uri.
#[derive(Debug)]
struct SavedCapture {
    source: String,
    saved: String,
}

enum Input {
    Script(std::vec::IntoIter<String>),
    Stdin(Lines<BufReader<Stdin>>),
}

impl Input {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        match self {
            Input::Script(lines) => Ok(lines.next()),
            Input::Stdin(lines) => lines.next_line().await,
        }
    }
}

pub async fn run(config: AppConfig, options: RunOptions) -> anyhow::Result<()> {
    let camera = Arc::new(SimulatedCamera::new(SimulatedConfig {
        permission_granted: !options.deny_permission,
        capture_dir: config.capture.capture_dir.clone(),
        materialize: true,
        ..SimulatedConfig::default()
    }));
    let session = CaptureSession::new(camera, SessionConfig::from(&config.capture));
    let store = GalleryStore::from_config(&config.gallery);
    let auto_save = options.auto_save || config.gallery.auto_save;
    let mut last_saved = None;

    let lens = options.lens.unwrap_or(config.capture.initial_lens);
    let flash = options.flash.unwrap_or(config.capture.initial_flash);

    let mut input = match options.script {
        Some(path) => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to read script {}: {e}", path.display()))?;
            Input::Script(content.lines().map(str::to_string).collect::<Vec<_>>().into_iter())
        }
        None => Input::Stdin(BufReader::new(tokio::io::stdin()).lines()),
    };

    match session.open(lens, flash).await {
        Ok(state) => println!("Camera open: {state}"),
        Err(SessionError::PermissionDenied) => {
            session.close().await;
            anyhow::bail!("No access to camera: permission denied");
        }
        Err(e) => {
            session.close().await;
            return Err(e.into());
        }
    }
    println!("Type 'help' for commands, 'close' or Ctrl+C to quit.");

    loop {
        let line = tokio::select! {
            line = input.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        };
        let Some(line) = line else { break };

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let command = match line.parse::<ScreenCommand>() {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        if command == ScreenCommand::Close {
            break;
        }

        if let Err(e) = execute(&session, &store, auto_save, &mut last_saved, command).await {
            report(&e);
        }
    }

    session.close().await;
    println!("Camera closed");
    Ok(())
}

async fn execute(
    session: &CaptureSession,
    store: &dyn ArtifactStore,
    auto_save: bool,
    last_saved: &mut Option<SavedCapture>,
    command: ScreenCommand,
) -> Result<(), SessionError> {
    match command {
        ScreenCommand::ToggleLens => {
            let lens = session.toggle_lens().await?;
            println!("Lens: {lens}");
        }
        ScreenCommand::ToggleFlash => {
            let flash = session.toggle_flash().await?;
            println!("Flash: {flash}");
        }
        ScreenCommand::Photo => {
            let artifact = session.capture_photo().await?;
            println!("Picture taken: {}", artifact.uri);
            if auto_save {
                save(store, last_saved, &artifact.uri, artifact.kind).await;
            }
        }
        ScreenCommand::Record => {
            session.start_recording().await?;
            println!("Recording... ('stop' to finish)");
        }
        ScreenCommand::Stop => {
            let artifact = session.stop_recording().await?;
            println!("Video recorded: {}", artifact.uri);
            if auto_save {
                save(store, last_saved, &artifact.uri, artifact.kind).await;
            }
        }
        ScreenCommand::Cancel => {
            let state = session.cancel_preview().await?;
            println!("Back to {state}");
        }
        ScreenCommand::Save => match session.state() {
            SessionState::PreviewingPhoto { uri } => {
                save(store, last_saved, &uri, ArtifactKind::Photo).await
            }
            SessionState::PreviewingVideo { uri } => {
                save(store, last_saved, &uri, ArtifactKind::Video).await
            }
            other => println!("Nothing to save while {}", other.name()),
        },
        ScreenCommand::State => print_state(session),
        ScreenCommand::Help => print_help(),
        ScreenCommand::Close => {}
    }
    Ok(())
}

async fn save(
    store: &dyn ArtifactStore,
    last_saved: &mut Option<SavedCapture>,
    uri: &str,
    kind: ArtifactKind,
) {
    if let Some(previous) = last_saved.as_ref().filter(|saved| saved.source == uri) {
        println!("This {kind} is already saved to {}", previous.saved);
        return;
    }
    match store.save(uri, kind).await {
        Ok(saved) => {
            println!("Saved {kind} to {saved}");
            *last_saved = Some(SavedCapture {
                source: uri.to_string(),
                saved,
            });
        }
        Err(e) => println!("[!] Failed to save {kind}: {e}"),
    }
}

fn report(error: &SessionError) {
    if error.is_user_facing() {
        println!("[!] {error}");
    } else {
        tracing::debug!(%error, "Ignored session command");
        println!("[-] {error}");
    }
}

fn print_state(session: &CaptureSession) {
    let state = session.state();
    match session.recording_elapsed() {
        Some(elapsed) => println!("{state} [{}]", format_elapsed(elapsed)),
        None => println!("{state}"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  lens     switch front/back camera");
    println!("  flash    toggle flash");
    println!("  photo    take a picture");
    println!("  record   start recording a video");
    println!("  stop     stop recording");
    println!("  cancel   dismiss the current preview");
    println!("  save     save the previewed capture to the gallery");
    println!("  state    show the session state");
    println!("  close    close the camera and exit");
}
