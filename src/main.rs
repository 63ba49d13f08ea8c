use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ml_battlesnake::ai::{BurnQApproximator, SnakeAgent, StateEncoder};
use ml_battlesnake::checkpoint::{CheckpointHyperparameters, CheckpointManager};
use ml_battlesnake::config::AppConfig;
use ml_battlesnake::host::HostSession;

/// Play Battlesnake games read as JSON lines and learn from each one.
#[derive(Parser)]
#[command(name = "ml_battlesnake", about = "Online Q-learning Battlesnake agent")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Read host events from this file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Resume from the latest checkpoint
    #[arg(long)]
    resume: bool,

    /// With --resume, start untrained when no checkpoint can be loaded
    #[arg(long)]
    fresh_on_load_failure: bool,

    /// Override exploration rate
    #[arg(long)]
    epsilon: Option<f32>,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", AppConfig::default_toml().context("rendering default config")?);
        return Ok(());
    }

    // Logs go to stderr; stdout carries the move responses.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(epsilon) = cli.epsilon {
        app_config.agent.epsilon = epsilon;
    }
    app_config.validate().context("validating config")?;

    let feature_len = StateEncoder::new(app_config.encoder.clone()).feature_len();
    let mut approximator = BurnQApproximator::new(feature_len, &app_config.network);

    let manager = CheckpointManager::new(app_config.checkpoint.clone());
    let mut resumed_episodes = 0;
    if cli.resume {
        if let Some(data) = manager
            .restore_approximator(&mut approximator, cli.fresh_on_load_failure)
            .context("resuming from checkpoint")?
        {
            resumed_episodes = data.metadata.episode;
        }
    }

    let mut agent = SnakeAgent::new(
        &app_config.agent,
        app_config.encoder.clone(),
        app_config.reward.clone(),
        approximator,
    );
    agent.metrics_mut().set_total_episodes(resumed_episodes);

    let hyperparameters = CheckpointHyperparameters {
        learning_rate: app_config.agent.learning_rate,
        discount_factor: app_config.agent.discount_factor,
        epsilon: app_config.agent.epsilon,
        board_width: app_config.encoder.board_width,
        board_height: app_config.encoder.board_height,
        hidden_size: app_config.network.hidden_size,
        network_learning_rate: app_config.network.learning_rate,
    };
    let mut session = HostSession::new(agent).with_checkpoints(manager, hyperparameters);

    let stdout = io::stdout().lock();
    let summary = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening input {}", path.display()))?;
            session.run(BufReader::new(file), stdout)
        }
        None => session.run(io::stdin().lock(), stdout),
    }
    .context("running host session")?;

    tracing::info!(
        games = summary.games_started,
        moves = summary.moves_answered,
        replaced = summary.moves_replaced,
        trained = summary.episodes_trained,
        failed = summary.episodes_failed,
        checkpoints = summary.checkpoints_saved,
        "session finished"
    );
    Ok(())
}
