//! FibBand Core — candle-by-candle simulation of a band-breakout /
//! retracement-zone strategy.
//!
//! This crate contains the simulation engine:
//! - Domain types (candles, bands, swing points, signals, trades)
//! - A single typed validation boundary for candles and swing points
//! - Band indicator trait with a Bollinger implementation
//! - Swing tracker, retracement calculator, signal evaluator, position manager
//! - Backtest loop and performance metrics
//!
//! The engine never logs. Skipped inputs and trading actions are reported
//! through a [`diagnostics::DiagnosticSink`] supplied by the caller.

pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod strategy;

pub use config::{BandParams, ConfigError, SignalFlags, StrategyConfig};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, NullSink};
pub use engine::{run_backtest, run_on_candles, BacktestResult, Timeframe};
