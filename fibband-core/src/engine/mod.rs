//! Backtesting engine — drives the strategy components over a candle series
//! and aggregates closed trades into a [`BacktestResult`].

pub mod backtest;
pub mod metrics;
pub mod result;
pub mod timeframe;

pub use backtest::{run_backtest, run_on_candles, VOLUME_MA_PERIOD};
pub use result::BacktestResult;
pub use timeframe::Timeframe;
