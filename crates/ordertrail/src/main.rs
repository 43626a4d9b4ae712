// crates/ordertrail/src/main.rs

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
use commands::generate::{handle_generate, GenerateArgs};
use commands::report::{handle_report, ReportArgs};
use commands::timelines::{handle_timelines, TimelinesArgs};

/// Delivery order timelines and KPI reports from raw event logs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pipeline settings (TOML). Falls back to ORDERTRAIL_CONFIG, then built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate KPIs over one or more event logs
    Report(ReportArgs),
    /// Dump reconstructed per-order timelines as JSON
    Timelines(TimelinesArgs),
    /// Write a seeded synthetic event log
    Generate(GenerateArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Report(args) => handle_report(args, cli.config.as_deref()),
        Command::Timelines(args) => handle_timelines(args, cli.config.as_deref()),
        Command::Generate(args) => handle_generate(args),
    }
}
