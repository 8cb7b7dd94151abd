use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod bluesky;
mod config;
mod pick;
mod ranges;
mod run;
mod schedule;
mod scrape;
mod telemetry;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "movie-bot", about = "Posts a random catalog film to Bluesky")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run(run::RunCmd),
    Pick(pick::PickCmd),
    Schedule(schedule::ScheduleCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and BOT_LOG_FORMAT
    telemetry::config::init_tracing();
    let cfg = AppConfig::from_env().context("invalid configuration")?;

    match cli.command {
        Commands::Run(args) => run::run(&cfg, args).await?,
        Commands::Pick(args) => pick::run(&cfg.scrape, args)?,
        Commands::Schedule(args) => schedule::run(&cfg, args).await?,
    }

    Ok(())
}
