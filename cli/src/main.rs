use anyhow::Result;
use blink_core::{GameConfig, GameEngine};
use blink_runtime::GameService;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::autopilot::Autopilot;
use crate::config::{FileConfig, RunConfig};
use crate::presenter::Presenter;

mod autopilot;
mod config;
mod presenter;

/// Reaction timing game: catch the highlighted cell before its time runs out.
///
/// The human side is played by an autopilot with a configurable reaction time.
#[derive(Parser, Debug)]
#[command(version, about)]
pub(crate) struct Cli {
    /// TOML file with default settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Board side length
    #[arg(short, long)]
    side_count: Option<String>,

    /// Round time limit in milliseconds, invalid values fall back to the default
    #[arg(short, long)]
    time_limit: Option<String>,

    /// Seed for cell selection and reaction times
    #[arg(long)]
    seed: Option<u64>,

    /// Fastest autopilot reaction in milliseconds
    #[arg(long)]
    reaction_min: Option<u64>,

    /// Slowest autopilot reaction in milliseconds
    #[arg(long)]
    reaction_max: Option<u64>,

    /// Number of games to play in a row
    #[arg(short = 'n', long, default_value_t = 1)]
    games: u32,

    /// Draw the board after every change
    #[arg(short, long)]
    board: bool,

    /// Print events and results as JSON lines
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn init_logging(level: log::LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose.log_level_filter());

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let run = RunConfig::new(&cli, file);
    log::info!(
        "Playing {} game(s) with seed {}, reaction {:?}ms",
        run.games,
        run.seed,
        run.reaction_ms
    );

    let (handle, service) = GameService::spawn(GameEngine::with_seed(GameConfig::default(), run.seed));
    handle.init_board(run.settings.clone())?;

    let mut autopilot = Autopilot::new(handle.clone(), run.seed, run.reaction_ms.clone());
    let mut presenter = Presenter::stdout(run.show_board, run.json);
    for game in 1..=run.games {
        let result = autopilot.play(run.settings.clone(), &mut presenter).await?;
        presenter.notify(game, result, handle.scores())?;
    }

    handle.shutdown()?;
    service.await?;
    Ok(())
}
