#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Sequence Ring as an interactive text session.

mod commands;
mod config;
mod session;
mod text;

use std::{
    fs::File,
    io::{self, BufRead, BufReader, IsTerminal},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use sequence_ring_core::catalog::{puzzle_by_slug, PUZZLE_CATALOG};
use sequence_ring_rendering::{Color, Presentation, RenderingBackend};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{FileConfig, Settings},
    session::Session,
    text::TextBackend,
};

const BACKGROUND: Color = Color::from_rgb_u8(0x1f, 0x29, 0x37);

#[derive(Debug, Parser)]
#[command(
    name = "sequence-ring",
    version,
    about = "Arrange twelve pieces around a ring in their hidden order"
)]
struct Cli {
    /// TOML file providing default settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Puzzle to play, by slug.
    #[arg(long)]
    puzzle: Option<String>,
    /// Failed checks allowed before the game is lost.
    #[arg(long)]
    tries: Option<u32>,
    /// Time a check takes to reveal every slot, in milliseconds.
    #[arg(long)]
    check_duration_ms: Option<u64>,
    /// Seed for the tray shuffle.
    #[arg(long)]
    seed: Option<u64>,
    /// Logical time advanced per tick while a check runs, in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,
    /// Reads commands from a file instead of standard input.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Disables ANSI colors.
    #[arg(long)]
    no_color: bool,
    /// Prints the available puzzles and exits.
    #[arg(long)]
    list_puzzles: bool,
}

impl Cli {
    fn flag_config(&self) -> FileConfig {
        FileConfig {
            puzzle: self.puzzle.clone(),
            total_tries: self.tries,
            check_duration_ms: self.check_duration_ms,
            seed: self.seed,
            tick_ms: self.tick_ms,
        }
    }
}

/// Entry point for the Sequence Ring command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if cli.list_puzzles {
        for entry in PUZZLE_CATALOG {
            println!("{} ({})", entry.slug, entry.label);
        }
        return Ok(());
    }

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(file.overridden_by(cli.flag_config()), rand::random)?;
    tracing::debug!(?settings, "resolved settings");

    let color = !cli.no_color && cli.script.is_none() && io::stdout().is_terminal();
    match &cli.script {
        Some(path) => {
            let script = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            play(&settings, BufReader::new(script), color, true)
        }
        None => play(&settings, io::stdin().lock(), color, false),
    }
}

fn play<R: BufRead>(settings: &Settings, input: R, color: bool, echo: bool) -> Result<()> {
    let mut session = Session::new(settings)?;
    let label = puzzle_by_slug(&settings.puzzle)
        .map_or(settings.puzzle.as_str(), |entry| entry.label);
    let title = format!("{} Puzzle: {label}. Type help for commands.", session.banner());
    let presentation = Presentation::new(title, BACKGROUND, session.scene());

    let backend = TextBackend::new(input, io::stdout().lock(), settings.tick)
        .with_color(color)
        .with_echo(echo);
    backend.run(presentation, move |dt, input, scene| {
        session.step(dt, input);
        *scene = session.scene();
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
