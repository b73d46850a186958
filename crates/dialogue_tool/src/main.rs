// SPDX-License-Identifier: MIT OR Apache-2.0
//! `dialogue` - command line front end for dialogue graphs
//!
//! - `check` validates a document and lists structural problems
//! - `flow` prints the node/edge view an editor canvas draws
//! - `normalize` pushes a document through the canvas view and back
//! - `play` previews the conversation on the console

mod commands;
mod player;

use clap::{Parser, Subcommand};
use commands::ToolError;
use dialogue_graph::DialogueDocument;
use dialogue_preview::{
    PreviewSession, PreviewSettings, TraversalEngine, settings::SETTINGS_FILE_NAME,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "dialogue",
    version,
    about = "Check, convert and play branching dialogue graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a dialogue document
    Check {
        /// Dialogue document (JSON)
        file: PathBuf,
    },
    /// Print the renderable nodes and edges as JSON
    Flow {
        /// Dialogue document (JSON)
        file: PathBuf,
        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Rebuild pointers and choice indices from the edge view
    Normalize {
        /// Dialogue document (JSON)
        file: PathBuf,
        /// Write here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Preview the conversation on the console
    Play {
        /// Dialogue document (JSON)
        file: PathBuf,
        /// Start at this node instead of the discovered root
        #[arg(long)]
        start: Option<String>,
        /// Preview settings (RON). Defaults to preview.ron beside the document.
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Event auto-advance delay in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dialogue_tool=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> commands::Result<()> {
    match command {
        Command::Check { file } => {
            let report = commands::check(&file)?;
            if report.is_clean() {
                println!("{}: ok", file.display());
            } else {
                println!("{}: {} problem(s)", file.display(), report.len());
                print!("{report}");
            }
        }
        Command::Flow { file, compact } => {
            println!("{}", commands::flow(&file, !compact)?);
        }
        Command::Normalize { file, output } => {
            let reconstruction = commands::normalize(&file, output.as_deref())?;
            for id in &reconstruction.discarded_edges {
                println!("discarded edge {id}");
            }
            for id in &reconstruction.overwritten_edges {
                println!("overwritten edge {id}");
            }
        }
        Command::Play {
            file,
            start,
            settings,
            delay_ms,
        } => {
            let mut settings = load_settings(&file, settings.as_deref())?;
            if let Some(start) = start {
                settings.start_node = Some(start.into());
            }
            if let Some(delay_ms) = delay_ms {
                settings.auto_advance_ms = delay_ms;
            }
            play(&file, &settings)?;
        }
    }
    Ok(())
}

fn load_settings(document: &Path, explicit: Option<&Path>) -> commands::Result<PreviewSettings> {
    if let Some(path) = explicit {
        return Ok(PreviewSettings::load(path)?);
    }
    let beside = document
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(SETTINGS_FILE_NAME);
    if beside.is_file() {
        tracing::debug!("Using settings from {}", beside.display());
        return Ok(PreviewSettings::load(&beside)?);
    }
    Ok(PreviewSettings::default())
}

fn play(file: &Path, settings: &PreviewSettings) -> Result<(), ToolError> {
    let document = DialogueDocument::load(file)?;
    tracing::info!("Playing {} ({} nodes)", document.info.title, document.nodes.len());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let engine = TraversalEngine::with_settings(document.graph(), settings);
        player::run(PreviewSession::new(engine), settings).await
    })
}
