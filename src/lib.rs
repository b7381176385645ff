pub mod analysis;
pub mod calories;
pub mod commands;
pub mod config;
pub mod db;
pub mod goals;
pub mod macro_split;
pub mod models;
pub mod progression;
pub mod threshold;
pub mod weeks;

#[cfg(test)]
mod test_utils;

use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use commands::log::FoodArgs;
use commands::phase::InitArgs;
use commands::PromptDecisions;
use config::Config;

#[derive(Parser)]
#[command(
  name = "phase-coach",
  about = "Adaptive diet phase coach",
  long_about = "Track a cut, maintenance or bulk phase. Weekly bodyweight trends adjust the calorie goal and macro split."
)]
pub struct Cli {
  #[command(subcommand)]
  command: Command,

  /// Database file override
  #[arg(long, global = true)]
  db: Option<PathBuf>,

  /// Evaluate as if today were this date (YYYY-MM-DD)
  #[arg(long, global = true)]
  today: Option<NaiveDate>,

  /// Enable debug logging
  #[arg(long, short = 'v', global = true)]
  verbose: bool,
}

#[derive(Subcommand)]
enum Command {
  /// Create the profile and first phase
  Init(InitArgs),

  /// Log a weigh-in in pounds
  Weigh {
    bodyweight: f64,

    /// Defaults to today (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
  },

  /// Log food eaten
  Food(FoodArgs),

  /// Evaluate progress and adjust calories
  Check {
    /// Show the result without saving it
    #[arg(long)]
    dry_run: bool,
  },

  /// Weekly summary of the current phase
  Status,

  /// Pause the active phase
  Pause,

  /// Resume a paused phase
  Resume,
}

/// Install the global subscriber: compact lines on stderr so stdout stays
/// clean for command output.
pub fn init_tracing(filter: &str) {
  let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config::DEFAULT_LOG_FILTER));
  tracing_subscriber::fmt()
    .compact()
    .with_writer(io::stderr)
    .with_ansi(false)
    .with_target(false)
    .with_env_filter(env_filter)
    .init();
}

pub async fn run() -> anyhow::Result<()> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let cli = Cli::parse();
  let mut config = Config::from_env()?;
  if let Some(db) = cli.db {
    config.db_path = db;
  }

  init_tracing(if cli.verbose { "debug" } else { config.log_filter.as_str() });

  let pool = db::initialize_db(&config.db_path).await?;
  let today = cli.today.unwrap_or_else(|| chrono::Local::now().date_naive());

  let result = match cli.command {
    Command::Init(args) => commands::phase::init(&pool, args, &config.macros, today).await,
    Command::Weigh { bodyweight, date } => {
      commands::log::weigh(&pool, date.unwrap_or(today), bodyweight).await
    }
    Command::Food(args) => commands::log::food(&pool, args, today).await,
    Command::Check { dry_run } => {
      let stdin = io::stdin();
      let mut prompt = PromptDecisions::new(stdin.lock(), io::stdout(), today);
      commands::progression::check(&pool, &config.macros, today, &mut prompt, dry_run).await
    }
    Command::Status => commands::phase::status(&pool, today).await,
    Command::Pause => commands::phase::pause(&pool).await,
    Command::Resume => commands::phase::resume(&pool).await,
  };

  pool.close().await;

  let output = result.map_err(anyhow::Error::msg)?;
  println!("{}", output);
  Ok(())
}
