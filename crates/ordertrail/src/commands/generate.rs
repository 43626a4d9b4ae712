// crates/ordertrail/src/commands/generate.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ordertrail_core::InputFormat;
use ordertrail_synth::{generate, write_events, GeneratorConfig};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of orders
    #[arg(long, default_value_t = 200)]
    pub count: usize,

    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// jsonl or csv
    #[arg(long, default_value = "jsonl")]
    pub format: InputFormat,

    #[arg(long, default_value = "data")]
    pub out_dir: PathBuf,

    /// Defaults to `event_log.<format>`
    #[arg(long)]
    pub out_file: Option<String>,

    #[arg(long, default_value_t = 0.03)]
    pub missing_rate: f64,

    #[arg(long, default_value_t = 0.02)]
    pub duplicate_rate: f64,

    #[arg(long, default_value_t = 0.05)]
    pub shuffle_rate: f64,

    #[arg(long, default_value = "baemin")]
    pub platform: String,
}

pub fn handle_generate(args: GenerateArgs) -> Result<()> {
    let config = GeneratorConfig {
        count: args.count,
        seed: args.seed,
        missing_rate: args.missing_rate,
        duplicate_rate: args.duplicate_rate,
        shuffle_rate: args.shuffle_rate,
        platform: args.platform,
    };

    let events = generate(&config).context("failed to generate events")?;

    let file_name = args
        .out_file
        .unwrap_or_else(|| format!("event_log.{}", args.format));
    let path = args.out_dir.join(file_name);
    write_events(&events, &path, args.format)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("Generated {} events from {} orders", events.len(), config.count);
    println!("Output: {}", path.display());
    println!(
        "Rates: missing={}, duplicate={}, shuffle={}, seed={}",
        config.missing_rate, config.duplicate_rate, config.shuffle_rate, config.seed
    );
    Ok(())
}
