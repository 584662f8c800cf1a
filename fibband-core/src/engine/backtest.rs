//! Candle-by-candle backtest loop for one configuration.
//!
//! Per candle `i` from `swing_lookback + 1`:
//!
//! 1. Skip the candle if it was rejected at ingestion
//! 2. Update swing points, then recompute retracement levels
//! 3. With a position open: timeout, else stop-loss / target / reversal
//! 4. When flat at the start of the step: evaluate signals and maybe open
//!
//! A position still open after the last candle is closed at the last valid
//! close with [`ExitReason::StrategyExit`]. Nothing here returns an error;
//! malformed input degrades to "no trade on this candle".

use super::result::BacktestResult;
use super::timeframe::Timeframe;
use crate::config::StrategyConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::domain::{BandValue, Candle, CandleSeries, ExitReason};
use crate::indicators::{sma, BandIndicator};
use crate::strategy::{
    PositionManager, RetracementCalculator, RetracementUpdate, SignalContext, SignalEvaluator,
    SwingTracker,
};

/// Window of the volume moving average used by the volume gate.
pub const VOLUME_MA_PERIOD: usize = 20;

/// Run one backtest over an ingested series and its index-aligned bands.
///
/// `bands` shorter than the series is tolerated; missing entries behave like
/// warm-up values.
pub fn run_backtest(
    series: &CandleSeries,
    bands: &[Option<BandValue>],
    config: &StrategyConfig,
    sink: &dyn DiagnosticSink,
) -> BacktestResult {
    let timeframe = Timeframe::detect(series);
    let n = series.len();

    let volumes: Vec<f64> = (0..n)
        .map(|i| series.get(i).map_or(f64::NAN, |c| c.volume))
        .collect();
    let volume_ma = sma(&volumes, VOLUME_MA_PERIOD);
    let band_at = |i: usize| bands.get(i).and_then(|b| b.as_ref());

    let mut tracker = SwingTracker::new(config.swing_lookback);
    tracker.initialize(series, sink);
    let mut levels = RetracementCalculator::new(config.golden_zone_min, config.golden_zone_max);
    levels.recompute(tracker.points());

    let evaluator = SignalEvaluator::new(config);
    let mut positions = PositionManager::new(config);
    let mut processed = 0;

    for i in (config.swing_lookback + 1)..n {
        let Some(candle) = series.get(i) else {
            continue;
        };
        processed += 1;

        tracker.update(series, i, sink);
        if let RetracementUpdate::DegenerateRange(price) = levels.recompute(tracker.points()) {
            sink.emit(&Diagnostic::DegenerateRetracementRange { index: i, price });
        }

        let band = band_at(i);

        if let Some(entry_time) = positions.open_trade().map(|t| t.entry_time) {
            let held = timeframe.held_units(entry_time, candle.timestamp);
            let exit = if positions.timed_out(held) {
                Some((ExitReason::Timeout, candle.close))
            } else {
                positions.check_exit(candle, band)
            };
            if let Some((reason, price)) = exit {
                positions.close(i, candle.timestamp, price, reason, sink);
            }
            continue;
        }

        let Some(band) = band else {
            sink.emit(&Diagnostic::MissingBand { index: i });
            continue;
        };
        let (Some(prev_candle), Some(prev_band)) = (series.get(i - 1), band_at(i - 1)) else {
            continue;
        };

        let ctx = SignalContext {
            candle,
            prev_candle,
            band,
            prev_band,
            volume_ma: volume_ma.get(i).copied().flatten(),
            levels: &levels,
        };
        if let Some(signal) = evaluator.evaluate(&ctx) {
            positions.try_open(&signal, i, candle.timestamp, sink);
        }
    }

    if positions.is_open() {
        if let Some((index, last)) = n.checked_sub(1).and_then(|end| series.last_valid_at_or_before(end)) {
            positions.close(index, last.timestamp, last.close, ExitReason::StrategyExit, sink);
        }
    }

    BacktestResult::from_trades(
        positions.into_trades(),
        config.initial_capital,
        timeframe,
        processed,
        series.rejected(),
    )
}

/// Ingest raw candles, compute bands with `indicator`, and run the backtest.
pub fn run_on_candles(
    candles: &[Candle],
    indicator: &dyn BandIndicator,
    config: &StrategyConfig,
    sink: &dyn DiagnosticSink,
) -> BacktestResult {
    let series = CandleSeries::ingest(candles, sink);
    let bands = indicator.compute(candles, &config.band);
    run_backtest(&series, &bands, config, sink)
}
