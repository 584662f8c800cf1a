//! FibBand CLI — backtest, optimize, and grid inspection commands.
//!
//! Commands:
//! - `backtest` — run one strategy configuration and print the result
//! - `optimize` — sweep a parameter grid and print the best combinations
//! - `grid-size` — report raw, pruned and surviving combination counts
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` to adjust.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use fibband_core::config::StrategyConfig;
use fibband_core::engine::{run_on_candles, BacktestResult};
use fibband_core::indicators::Bollinger;
use fibband_runner::{
    load_csv, load_strategy_config, load_synthetic, LoadedCandles, OptimizationProgress,
    OptimizationResult, Optimizer, SweepFile, TracingSink,
};

#[derive(Parser)]
#[command(
    name = "fibband",
    about = "FibBand CLI — band breakout / retracement zone backtesting and optimization"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest and print the result as JSON.
    Backtest {
        #[command(flatten)]
        data: DataArgs,

        /// Strategy config (TOML). Defaults to the built-in configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print a text summary instead of JSON.
        #[arg(long, default_value_t = false)]
        summary: bool,
    },
    /// Sweep a parameter grid and print the top results as JSON.
    Optimize {
        #[command(flatten)]
        data: DataArgs,

        /// Sweep file (TOML). Defaults to the curated grid with no filters.
        #[arg(long)]
        sweep: Option<PathBuf>,

        /// Number of results to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Simulate combinations on all cores.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Log a progress line every this many combinations.
        #[arg(long, default_value_t = 1000)]
        progress_every: usize,
    },
    /// Print raw, pruned and surviving combination counts for a grid.
    GridSize {
        /// Sweep file (TOML). Defaults to the curated grid.
        #[arg(long)]
        sweep: Option<PathBuf>,
    },
}

#[derive(Args)]
struct DataArgs {
    /// Candle CSV with a timestamp,open,high,low,close,volume header.
    #[arg(long, conflicts_with = "synthetic")]
    candles: Option<PathBuf>,

    /// Use this many synthetic one-minute candles instead of a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed label for synthetic candles.
    #[arg(long, default_value = "fibband")]
    label: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            data,
            config,
            summary,
        } => run_backtest_cmd(&data, config, summary),
        Commands::Optimize {
            data,
            sweep,
            top,
            parallel,
            progress_every,
        } => run_optimize_cmd(&data, sweep, top, parallel, progress_every),
        Commands::GridSize { sweep } => run_grid_size(sweep),
    }
}

fn load_candles(args: &DataArgs) -> Result<LoadedCandles> {
    let loaded = match (&args.candles, args.synthetic) {
        (Some(path), _) => {
            load_csv(path).with_context(|| format!("loading {}", path.display()))?
        }
        (None, Some(n)) => load_synthetic(&args.label, n),
        (None, None) => bail!("one of --candles or --synthetic is required"),
    };
    let start = loaded.candles.first().and_then(|c| c.datetime());
    let end = loaded.candles.last().and_then(|c| c.datetime());
    tracing::info!(
        source = %loaded.source,
        candles = loaded.candles.len(),
        ?start,
        ?end,
        rejected = loaded.rejected,
        dataset = %&loaded.dataset_hash[..12],
        "candles loaded"
    );
    if loaded.is_synthetic() {
        tracing::warn!("results are based on SYNTHETIC data");
    }
    Ok(loaded)
}

fn load_sweep(path: Option<PathBuf>) -> Result<SweepFile> {
    match path {
        Some(path) => {
            SweepFile::load(&path).with_context(|| format!("loading sweep {}", path.display()))
        }
        None => Ok(SweepFile::default()),
    }
}

fn run_backtest_cmd(data: &DataArgs, config_path: Option<PathBuf>, summary: bool) -> Result<()> {
    let config = match config_path {
        Some(path) => load_strategy_config(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StrategyConfig::default(),
    };
    config.validate()?;
    let loaded = load_candles(data)?;

    tracing::info!(config = %config.describe(), "running backtest");
    let result = run_on_candles(&loaded.candles, &Bollinger, &config, &TracingSink);

    if summary {
        print_summary(&config, &result);
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

fn run_optimize_cmd(
    data: &DataArgs,
    sweep_path: Option<PathBuf>,
    top: usize,
    parallel: bool,
    progress_every: usize,
) -> Result<()> {
    let sweep = load_sweep(sweep_path)?;
    let loaded = load_candles(data)?;

    let mut settings = sweep.optimizer.clone();
    settings.parallel |= parallel;
    settings.max_results = Some(settings.max_results.map_or(top, |n| n.min(top)));

    let every = progress_every.max(1);
    let log_progress = |p: &OptimizationProgress| {
        if p.running && p.current % every != 0 {
            return;
        }
        tracing::info!(
            current = p.current,
            total = p.total,
            accepted = p.accepted,
            failed = p.failed,
            best = p.best.as_ref().map_or(0.0, |b| b.score),
            eta_secs = p.eta_secs.unwrap_or(0.0),
            "{}",
            p.description
        );
    };

    let report = Optimizer::new(&Bollinger)
        .with_config(settings)
        .optimize_all(
            &loaded.candles,
            &sweep.base,
            &sweep.grid,
            &sweep.filters,
            Some(&log_progress),
            None,
        )?;

    for failure in &report.failures {
        tracing::warn!(index = failure.index, "{}: {}", failure.label, failure.error);
    }
    if report.results.is_empty() {
        tracing::warn!("no configuration met the filters");
    }

    let top_results: &[OptimizationResult] = report.top_n(top);
    println!("{}", serde_json::to_string_pretty(top_results)?);
    Ok(())
}

fn run_grid_size(sweep_path: Option<PathBuf>) -> Result<()> {
    let sweep = load_sweep(sweep_path)?;
    let raw = sweep.grid.raw_size();
    let surviving = sweep.grid.surviving_size(sweep.optimizer.min_reward_risk);

    println!("Raw combinations:       {raw}");
    println!("Pruned before running:  {}", raw.saturating_sub(surviving));
    println!("Surviving combinations: {surviving}");
    Ok(())
}

fn print_summary(config: &StrategyConfig, result: &BacktestResult) {
    println!();
    println!("=== Backtest Result ===");
    println!("Config:         {}", config.describe());
    println!(
        "Candles:        {} ({} rejected, {:?})",
        result.candles_processed, result.candles_rejected, result.timeframe
    );
    println!(
        "Trades:         {} ({} won, {} lost)",
        result.total_trades, result.winning_trades, result.losing_trades
    );
    println!();
    println!("--- Performance ---");
    println!(
        "Capital:        {:.2} -> {:.2}",
        result.initial_capital, result.final_capital
    );
    println!("Total Return:   {:.2}%", result.total_return * 100.0);
    println!("Win Rate:       {:.1}%", result.win_rate * 100.0);
    println!("Sharpe:         {:.3}", result.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", result.max_drawdown * 100.0);
    println!("Profit Factor:  {:.2}", result.profit_factor);
    println!(
        "Period:         {:.2} days, {:.2} trades/day",
        result.trading_period_days, result.trades_per_day
    );
    println!("Avg Strength:   {:.1}", result.avg_signal_strength);
}
