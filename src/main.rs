mod types;
mod config;
mod storage;
mod models;
mod ensemble;
mod engine;
mod database;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::EngineConfig;
use engine::{load_ticks_csv, DecisionEngine, ReplayConfig, ReplayEngine};
use storage::{SledStore, StateStore};
use types::TickBuffer;

#[derive(Parser)]
#[command(name = "parity-bot")]
#[command(author = "Trading Bot")]
#[command(version = "0.1.0")]
#[command(about = "Even/odd digit prediction ensemble for market tick streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded tick file through the engine, settling each wager
    /// against the following tick
    Replay {
        /// CSV file of timestamp,quote rows
        #[arg(short, long)]
        file: String,

        /// State store directory (value table + accuracy records)
        #[arg(long, default_value = "data/state")]
        state: String,

        /// SQLite database path for decision/wager history
        #[arg(long)]
        db: Option<String>,

        /// Stake per wager
        #[arg(long, default_value = "1.0")]
        stake: f64,

        /// Win payout as a fraction of the stake
        #[arg(long, default_value = "0.95")]
        payout: f64,
    },
    /// Make a one-shot decision on the tail of a tick file and print it
    Decide {
        /// CSV file of timestamp,quote rows
        #[arg(short, long)]
        file: String,

        /// State store directory
        #[arg(long, default_value = "data/state")]
        state: String,
    },
    /// Write the default configuration to the config path
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Parity Trading Bot v0.1.0");

    match cli.command {
        Commands::Replay {
            file,
            state,
            db,
            stake,
            payout,
        } => {
            let engine_config = config::load_or_default(&cli.config)?;
            let replay_config = ReplayConfig {
                stake: Decimal::try_from(stake)?,
                payout_ratio: Decimal::try_from(payout)?,
            };
            run_replay(engine_config, replay_config, &file, &state, db.as_deref()).await?;
        }
        Commands::Decide { file, state } => {
            let engine_config = config::load_or_default(&cli.config)?;
            run_decide(engine_config, &file, &state)?;
        }
        Commands::InitConfig => {
            config::save(&EngineConfig::default(), &cli.config)?;
        }
    }

    Ok(())
}

async fn run_replay(
    engine_config: EngineConfig,
    replay_config: ReplayConfig,
    file: &str,
    state_dir: &str,
    db_path: Option<&str>,
) -> Result<()> {
    let ticks = load_ticks_csv(file, engine_config.general.pip_digits)?;
    let store: Arc<dyn StateStore> = Arc::new(SledStore::open(state_dir)?);

    let db = match db_path {
        Some(path) => Some(database::Database::new(path).await?),
        None => None,
    };

    let mut replay = ReplayEngine::new(engine_config, store, replay_config);
    let summary = replay.run(&ticks, db.as_ref()).await?;

    info!(
        "Summary: {} ticks, {} decisions, {} trades ({} wins / {} losses, {:.1}% win rate), PnL {}",
        summary.ticks,
        summary.decisions,
        summary.trades,
        summary.wins,
        summary.losses,
        summary.win_rate() * 100.0,
        summary.pnl
    );
    Ok(())
}

fn run_decide(engine_config: EngineConfig, file: &str, state_dir: &str) -> Result<()> {
    let ticks = load_ticks_csv(file, engine_config.general.pip_digits)?;
    let store: Arc<dyn StateStore> = Arc::new(SledStore::open(state_dir)?);

    let mut buffer = TickBuffer::new(engine_config.general.max_history);
    for tick in ticks {
        buffer.push(tick);
    }

    let mut engine = DecisionEngine::new(engine_config, store);
    let decision = engine.decide(&buffer);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
