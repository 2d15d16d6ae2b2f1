//! QuoteLab CLI: replay, synthetic data, and config checks.
//!
//! Commands:
//! - `replay` feeds a JSON-lines step file through the engine, threading `trader_data`
//! - `synth` writes deterministic random-walk steps for the configured products
//! - `check` validates a TOML config and prints its fingerprint and strategy table

mod io;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use quotelab_core::domain::{StepInput, StepOutput};
use quotelab_core::strategy::Rule;
use quotelab_core::synthetic::{generate_steps, WalkParams};
use quotelab_core::{Engine, EngineConfig, StrategyPreset};

#[derive(Parser)]
#[command(
    name = "quotelab",
    about = "QuoteLab CLI: valuation, signals and order sizing for a simulated exchange"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded steps through the engine.
    Replay {
        /// Path to a TOML config file.
        #[arg(long, conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Named preset: mean_reversion, trend_following, market_making.
        #[arg(long)]
        preset: Option<String>,

        /// JSON-lines file, one step per line.
        #[arg(long)]
        input: PathBuf,

        /// JSON-lines file for the step outputs.
        #[arg(long)]
        output: Option<PathBuf>,

        /// CSV file with one row per emitted order.
        #[arg(long)]
        orders_csv: Option<PathBuf>,
    },
    /// Generate deterministic synthetic steps.
    Synth {
        /// Number of steps to generate.
        #[arg(long, default_value_t = 1000)]
        steps: usize,

        /// Master seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Path to a TOML config file.
        #[arg(long, conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Named preset. Defaults to market_making.
        #[arg(long)]
        preset: Option<String>,

        /// Per-step mid volatility in ticks.
        #[arg(long)]
        volatility: Option<f64>,

        /// Output JSON-lines file.
        #[arg(long)]
        output: PathBuf,
    },
    /// Validate a config file and print its strategy table.
    Check {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            config,
            preset,
            input,
            output,
            orders_csv,
        } => run_replay(
            config.as_deref(),
            preset.as_deref(),
            &input,
            output.as_deref(),
            orders_csv.as_deref(),
        ),
        Commands::Synth {
            steps,
            seed,
            config,
            preset,
            volatility,
            output,
        } => run_synth(
            config.as_deref(),
            preset.as_deref(),
            steps,
            seed,
            volatility,
            &output,
        ),
        Commands::Check { config } => run_check(&config),
    }
}

/// Config from `--config` or `--preset`. Falls back to `default` when neither is given.
fn resolve_config(
    config: Option<&Path>,
    preset: Option<&str>,
    default: Option<StrategyPreset>,
) -> Result<EngineConfig> {
    match (config, preset) {
        (Some(path), None) => Ok(EngineConfig::load(path)?),
        (None, Some(name)) => Ok(name.parse::<StrategyPreset>()?.to_config()),
        (None, None) => match default {
            Some(preset) => Ok(preset.to_config()),
            None => bail!("Either --config or --preset is required"),
        },
        (Some(_), Some(_)) => bail!("--config and --preset are mutually exclusive"),
    }
}

/// Run every step through a fresh engine, feeding each output's `trader_data`
/// into the next step as the exchange harness does.
fn replay(config: EngineConfig, steps: Vec<StepInput>) -> Result<Vec<StepOutput>> {
    let mut engine = Engine::new(config)?;
    let mut outputs: Vec<StepOutput> = Vec::with_capacity(steps.len());
    for (i, mut step) in steps.into_iter().enumerate() {
        if let Some(previous) = outputs.last() {
            step.trader_data = previous.trader_data.clone();
        }
        let output = engine
            .step(step)
            .with_context(|| format!("Step {i} failed"))?;
        outputs.push(output);
    }
    Ok(outputs)
}

fn run_replay(
    config: Option<&Path>,
    preset: Option<&str>,
    input: &Path,
    output: Option<&Path>,
    orders_csv: Option<&Path>,
) -> Result<()> {
    let config = resolve_config(config, preset, None)?;
    let steps: Vec<StepInput> = io::read_jsonl(input)?;
    info!(steps = steps.len(), input = %input.display(), "replaying");

    let outputs = replay(config, steps)?;

    if let Some(path) = output {
        io::write_jsonl(path, &outputs)?;
        println!("Outputs written to: {}", path.display());
    }
    if let Some(path) = orders_csv {
        io::write_orders_csv(path, &outputs)?;
        println!("Orders written to: {}", path.display());
    }
    print_summary(&outputs);
    Ok(())
}

fn run_synth(
    config: Option<&Path>,
    preset: Option<&str>,
    steps: usize,
    seed: u64,
    volatility: Option<f64>,
    output: &Path,
) -> Result<()> {
    let config = resolve_config(config, preset, Some(StrategyPreset::MarketMaking))?;
    let mut params = WalkParams::default();
    if let Some(v) = volatility {
        if v.is_nan() || v < 0.0 {
            bail!("--volatility must be >= 0, got {v}");
        }
        params.volatility = v;
    }

    let generated = generate_steps(&config, &params, steps, seed);
    io::write_jsonl(output, &generated)?;
    println!(
        "Wrote {} steps for {} product(s) to {}",
        generated.len(),
        config.products.len(),
        output.display()
    );
    Ok(())
}

fn run_check(path: &Path) -> Result<()> {
    let config = EngineConfig::load(path)?;
    let engine = Engine::new(config)?;

    println!("Config:      {}", path.display());
    println!("Fingerprint: {}", engine.fingerprint());
    println!("Conversions: {}", engine.config().conversions);
    println!();
    println!(
        "{:<18} {:<22} {:<16} {:>6} {:>8} {:>10}",
        "Product", "Rule", "Estimator", "Limit", "Window", "Fallback"
    );
    println!("{}", "-".repeat(84));
    for (product, strategy) in &engine.config().products {
        let rule = engine
            .table()
            .get(product)
            .map(|s| s.rule_name().to_string())
            .unwrap_or_default();
        let window = match strategy.rule {
            Rule::Signal(_) => strategy.window.to_string(),
            Rule::Quote(_) => "-".to_string(),
        };
        println!(
            "{:<18} {:<22} {:<16} {:>6} {:>8} {:>10.1}",
            product,
            rule,
            strategy.estimator.name(),
            strategy.max_position,
            window,
            strategy.fallback_price
        );
    }
    Ok(())
}

fn print_summary(outputs: &[StepOutput]) {
    let mut per_product: BTreeMap<&str, (usize, i64, i64)> = BTreeMap::new();
    for order in outputs.iter().flat_map(|o| o.all_orders()) {
        let entry = per_product.entry(order.product.as_str()).or_default();
        entry.0 += 1;
        if order.quantity > 0 {
            entry.1 += order.quantity;
        } else {
            entry.2 -= order.quantity;
        }
    }

    println!();
    println!("=== Replay Summary ===");
    println!("Steps:          {}", outputs.len());
    println!(
        "Orders:         {}",
        per_product.values().map(|(n, _, _)| n).sum::<usize>()
    );
    println!();
    println!("{:<18} {:>8} {:>10} {:>10}", "Product", "Orders", "Bought", "Sold");
    println!("{}", "-".repeat(49));
    for (product, (n, bought, sold)) in &per_product {
        println!("{:<18} {:>8} {:>10} {:>10}", product, n, bought, sold);
    }
}
