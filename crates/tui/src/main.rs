mod app;
mod persist;
mod theme;

use anyhow::{Context, Result};
use clap::Parser;
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};
use quizboard_core::{
    config::{self, AppConfig},
    resource::{self, preset_from_query},
    GameEngine, NullSink, PresetLibrary, SnapshotSink, SnapshotStore,
};

use crate::{app::QuizApp, persist::SnapshotWriter};

/// Host a quiz show game night from the terminal.
#[derive(Debug, Parser)]
#[command(name = "quizboard", version, about)]
struct Cli {
    /// Start the preset with this id.
    #[arg(long)]
    preset: Option<String>,
    /// Link carrying a `?game=<id>` query that names a preset.
    #[arg(long)]
    url: Option<String>,
    /// Game file to load.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Ignore the saved session and start from a new game.
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config.log_dir())?;
    info!(
        save_dir = %config.save_dir.display(),
        presets_dir = %config.presets_dir.display(),
        autosave = config.autosave,
        "Starting quizboard"
    );

    let store = SnapshotStore::new(&config.save_dir);
    let presets = PresetLibrary::new(&config.presets_dir);
    let (sink, writer): (Box<dyn SnapshotSink>, _) = if config.autosave {
        let (writer, handle) = SnapshotWriter::spawn(store.clone());
        (Box::new(writer), Some(handle))
    } else {
        (Box::new(NullSink), None)
    };

    let mut app = QuizApp::new(GameEngine::new(sink), store.clone(), presets.clone());
    if let Err(err) = app.refresh_loader() {
        error!(?err, "Failed to list games");
        app.set_status(format!("Failed to list games: {err:#}"));
    }
    initial_load(&mut app, &cli, &store, &presets).await;

    let result = app.run().await;
    // The writer finishes once the engine's sink is dropped.
    drop(app);
    if let Some(handle) = writer {
        if let Err(err) = handle.await {
            error!(?err, "Snapshot writer did not finish");
        }
    }
    result
}

/// Resume the saved session, or fall back to a preset or game file named on
/// the command line.
async fn initial_load(app: &mut QuizApp, cli: &Cli, store: &SnapshotStore, presets: &PresetLibrary) {
    if !cli.fresh {
        match store.load_snapshot() {
            Ok(Some(data)) => {
                if app.load("saved session", data) {
                    return;
                }
            }
            Ok(None) => {}
            Err(err) => warn!(?err, "Saved session unreadable"),
        }
    }

    let preset = cli
        .preset
        .clone()
        .or_else(|| cli.url.as_deref().and_then(preset_from_query));
    if let Some(id) = preset {
        match presets.load(&id) {
            Ok(data) => {
                if app.load(&id, data) {
                    return;
                }
            }
            Err(err) => {
                warn!(preset = %id, ?err, "Preset unavailable");
                app.set_status(format!("Failed to load preset {id}: {err:#}"));
            }
        }
    } else if let Some(url) = cli.url.as_deref() {
        app.set_status(format!("No game named in {url}"));
    }

    if let Some(path) = cli.file.as_deref() {
        let source = path.display().to_string();
        match resource::load_file(path).await {
            Ok(data) => {
                app.load(&source, data);
            }
            Err(err) => {
                warn!(path = %source, %err, "Game file unavailable");
                app.set_status(format!("Failed to load {source}: {err}"));
            }
        }
    }
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("quizboard.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quizboard=info,quizboard_core=info"));

    // The terminal belongs to the UI, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
