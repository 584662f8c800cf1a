//! FibBand Runner — parameter sweeps over the `fibband-core` engine.
//!
//! This crate builds on `fibband-core` to provide:
//! - Candle loading from CSV or a deterministic synthetic generator
//! - Sweep files (TOML) with base strategy, grid, filters and run settings
//! - Mixed-radix parameter grid with pre-simulation pruning
//! - Acceptance filters and the composite score
//! - The grid optimizer (sequential or rayon-parallel, cancellable)
//! - A `tracing` diagnostic sink for engine events

pub mod config;
pub mod data_loader;
pub mod filters;
pub mod grid;
pub mod optimizer;
pub mod scoring;
pub mod tracing_sink;

pub use config::{
    config_fingerprint, load_strategy_config, OptimizerConfig, SweepFile, SweepFileError,
};
pub use data_loader::{
    dataset_hash, generate_synthetic_candles, load_csv, load_synthetic, DataSource, LoadError,
    LoadedCandles,
};
pub use filters::{FilterRejection, OptimizationFilters};
pub use grid::{prune_reason, ParamGrid, PruneReason};
pub use optimizer::{
    optimize_all, FailedCombination, OptimizationProgress, OptimizationReport,
    OptimizationResult, OptimizeError, Optimizer, SweepSummary,
};
pub use scoring::ScoreBreakdown;
pub use tracing_sink::TracingSink;
