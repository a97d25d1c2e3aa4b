//! Shutter CLI — drive a camera capture session from the terminal.
//!
//! Usage:
//!   shutter run [OPTIONS]       Open a camera session and read commands
//!   shutter config [--init]     Show (or write) the effective configuration
//!   shutter gallery [KIND]      List saved photos and videos
//!   shutter check               Check directories and configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shutter_common::camera::{ArtifactKind, Flash, Lens};
use shutter_common::config::{config_file_path, AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "shutter",
    about = "Camera screen capture session driver",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/shutter/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a camera session on the simulated device and read commands
    Run {
        /// Initial lens (front|back)
        #[arg(long)]
        lens: Option<Lens>,

        /// Initial flash mode (off|on)
        #[arg(long)]
        flash: Option<Flash>,

        /// Read commands from a file instead of stdin
        #[arg(long)]
        script: Option<PathBuf>,

        /// Save every capture to the gallery as soon as it is previewed
        #[arg(long)]
        auto_save: bool,

        /// Simulate a denied camera permission
        #[arg(long)]
        deny_permission: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file
        #[arg(long)]
        init: bool,
    },

    /// List saved captures
    Gallery {
        /// Only list this kind (photo|video)
        #[arg(value_parser = parse_kind)]
        kind: Option<ArtifactKind>,
    },

    /// Check directories and configuration
    Check,
}

fn parse_kind(s: &str) -> Result<ArtifactKind, String> {
    match s.to_ascii_lowercase().as_str() {
        "photo" | "photos" => Ok(ArtifactKind::Photo),
        "video" | "videos" => Ok(ArtifactKind::Video),
        other => Err(format!("unknown artifact kind '{other}'")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config_file_path);
    let config = AppConfig::load_from(&config_path);

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    shutter_common::logging::init_logging(&LoggingConfig {
        level,
        json: cli.json_logs || config.logging.json,
        file: config.logging.file.clone(),
    });

    match cli.command {
        Commands::Run {
            lens,
            flash,
            script,
            auto_save,
            deny_permission,
        } => {
            commands::run::run(
                config,
                commands::run::RunOptions {
                    lens,
                    flash,
                    script,
                    auto_save,
                    deny_permission,
                },
            )
            .await
        }
        Commands::Config { init } => commands::config::run(&config, &config_path, init),
        Commands::Gallery { kind } => commands::gallery::run(&config, kind).await,
        Commands::Check => commands::check::run(&config, &config_path),
    }
}
