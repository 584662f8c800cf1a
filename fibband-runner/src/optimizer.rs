//! Grid optimizer — exhaustive sweep over a [`ParamGrid`].
//!
//! Per combination, in index order:
//!
//! 1. Decode the configuration; prune invalid golden zones, non-positive
//!    ranges and poor reward/risk ratios without simulating
//! 2. Compute (or reuse) the band series for its band parameters
//! 3. Run the backtest, isolated so a panic fails only this combination
//! 4. Apply the acceptance filters; score and keep the survivors
//! 5. Publish a progress snapshot
//!
//! The calling thread yields every `yield_every` combinations. In parallel
//! mode each batch of `yield_every` combinations is simulated on the rayon
//! pool and then recorded in index order, so the ranked output is identical
//! to a sequential sweep.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fibband_core::config::{BandParams, StrategyConfig};
use fibband_core::diagnostics::{DiagnosticSink, NullSink};
use fibband_core::domain::{BandValue, Candle, CandleSeries};
use fibband_core::engine::{run_backtest, BacktestResult};
use fibband_core::indicators::{BandIndicator, Bollinger};

use crate::config::{config_fingerprint, OptimizerConfig};
use crate::filters::OptimizationFilters;
use crate::grid::{prune_reason, ParamGrid};
use crate::scoring::ScoreBreakdown;

// ─── Result types ────────────────────────────────────────────────────

/// One accepted combination: its parameters, metrics and score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    // ── Identity ──
    pub index: usize,
    pub fingerprint: String,
    pub label: String,
    pub config: StrategyConfig,

    // ── Score ──
    pub score: f64,
    pub breakdown: ScoreBreakdown,

    // ── Metrics ──
    pub total_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub profit_factor: f64,
    pub trading_period_days: f64,
    pub trades_per_day: f64,

    // ── Quality ──
    pub avg_signal_strength: f64,
    pub avg_trade_duration_ms: f64,
}

impl OptimizationResult {
    fn new(index: usize, config: StrategyConfig, result: &BacktestResult) -> Self {
        let breakdown = ScoreBreakdown::compute(result, &config);
        Self {
            index,
            fingerprint: config_fingerprint(&config),
            label: config.describe(),
            score: breakdown.composite,
            breakdown,
            total_trades: result.total_trades,
            win_rate: result.win_rate,
            total_pnl: result.total_pnl,
            total_return: result.total_return,
            max_drawdown: result.max_drawdown,
            sharpe_ratio: result.sharpe_ratio,
            profit_factor: result.profit_factor,
            trading_period_days: result.trading_period_days,
            trades_per_day: result.trades_per_day,
            avg_signal_strength: result.avg_signal_strength,
            avg_trade_duration_ms: result.avg_trade_duration_ms,
            config,
        }
    }

    /// Descending score, then ascending combination index.
    fn rank_cmp(a: &Self, b: &Self) -> std::cmp::Ordering {
        b.score.total_cmp(&a.score).then(a.index.cmp(&b.index))
    }
}

/// Snapshot published after every simulated combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationProgress {
    /// Combinations simulated or failed so far.
    pub current: usize,
    /// Combinations that survive pruning.
    pub total: usize,
    pub description: String,
    pub running: bool,
    pub best: Option<OptimizationResult>,
    pub elapsed_secs: f64,
    pub eta_secs: Option<f64>,
    pub accepted: usize,
    pub failed: usize,
}

/// Counts for a finished (or cancelled) sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub raw_combinations: usize,
    pub pruned: usize,
    pub simulated: usize,
    pub failed: usize,
    pub filtered_out: usize,
    pub accepted: usize,
    pub cancelled: bool,
    pub elapsed_secs: f64,
}

/// A combination whose simulation panicked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCombination {
    pub index: usize,
    pub label: String,
    pub error: String,
}

/// Ranked results plus sweep accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub results: Vec<OptimizationResult>,
    pub summary: SweepSummary,
    pub failures: Vec<FailedCombination>,
}

impl OptimizationReport {
    pub fn best(&self) -> Option<&OptimizationResult> {
        self.results.first()
    }

    pub fn top_n(&self, n: usize) -> &[OptimizationResult] {
        &self.results[..n.min(self.results.len())]
    }
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("no candles to optimize over")]
    NoCandles,

    #[error("parameter grid has an empty dimension")]
    EmptyGrid,

    #[error("base initial capital must be positive and finite, got {0}")]
    InvalidCapital(f64),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

// ─── Optimizer ───────────────────────────────────────────────────────

type BandSeries = Arc<Vec<Option<BandValue>>>;
type BandKey = (usize, u64, usize);

fn band_key(params: &BandParams) -> BandKey {
    (params.period, params.std_dev.to_bits(), params.offset)
}

/// Outcome of one simulated combination.
type Outcome = Result<BacktestResult, String>;

/// Sweep driver. Holds the band indicator, run settings and diagnostic sink.
pub struct Optimizer<'a> {
    indicator: &'a dyn BandIndicator,
    sink: &'a dyn DiagnosticSink,
    config: OptimizerConfig,
}

impl<'a> Optimizer<'a> {
    pub fn new(indicator: &'a dyn BandIndicator) -> Self {
        Self {
            indicator,
            sink: &NullSink,
            config: OptimizerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sink(mut self, sink: &'a dyn DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    /// Enables or disables parallel simulation.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Run the sweep.
    ///
    /// # Arguments
    /// - `candles`: read-only for the whole sweep.
    /// - `base`: source of fields the grid does not vary (initial capital).
    /// - `progress_cb`: called on the calling thread after each combination.
    /// - `cancel`: checked before each combination (each batch in parallel
    ///   mode); a cancelled sweep returns what it has.
    pub fn optimize_all(
        &self,
        candles: &[Candle],
        base: &StrategyConfig,
        grid: &ParamGrid,
        filters: &OptimizationFilters,
        progress_cb: Option<&dyn Fn(&OptimizationProgress)>,
        cancel: Option<&AtomicBool>,
    ) -> Result<OptimizationReport, OptimizeError> {
        if candles.is_empty() {
            return Err(OptimizeError::NoCandles);
        }
        let raw = grid.raw_size();
        if raw == 0 {
            return Err(OptimizeError::EmptyGrid);
        }
        if !(base.initial_capital.is_finite() && base.initial_capital > 0.0) {
            return Err(OptimizeError::InvalidCapital(base.initial_capital));
        }

        let pool = match (self.config.parallel, self.config.threads) {
            (true, Some(threads)) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| OptimizeError::ThreadPool(e.to_string()))?,
            ),
            _ => None,
        };

        let total = grid.surviving_size(self.config.min_reward_risk);
        tracing::info!(
            raw,
            surviving = total,
            parallel = self.config.parallel,
            "starting sweep"
        );

        let series = CandleSeries::ingest(candles, self.sink);
        let batch = self.config.yield_every.max(1);
        let mut state = SweepState::new(raw, total, filters, self.config.max_results);
        let mut bands: HashMap<BandKey, Result<BandSeries, String>> = HashMap::new();

        let mut next = 0;
        while next < raw {
            if is_cancelled(cancel) {
                state.summary.cancelled = true;
                break;
            }
            let end = (next + batch).min(raw);

            // Decode and prune the batch.
            let mut work: Vec<(usize, StrategyConfig)> = Vec::with_capacity(end - next);
            for index in next..end {
                let Some(config) = grid.config_at(index, base) else {
                    continue;
                };
                if let Some(reason) = prune_reason(&config, self.config.min_reward_risk) {
                    tracing::trace!(index, ?reason, "pruned");
                    state.summary.pruned += 1;
                    continue;
                }
                work.push((index, config));
            }
            next = end;

            // Bands for this batch; entries no longer needed are dropped.
            bands.retain(|key, _| work.iter().any(|(_, c)| band_key(&c.band) == *key));
            for (_, config) in &work {
                bands
                    .entry(band_key(&config.band))
                    .or_insert_with(|| self.compute_bands(candles, &config.band));
            }

            if self.config.parallel {
                let run = || {
                    work.into_par_iter()
                        .map(|(index, config)| {
                            let outcome = self.simulate(&series, &bands, &config);
                            (index, config, outcome)
                        })
                        .collect::<Vec<_>>()
                };
                let outcomes = match &pool {
                    Some(pool) => pool.install(run),
                    None => run(),
                };
                for (index, config, outcome) in outcomes {
                    state.record(index, config, outcome, progress_cb);
                }
            } else {
                for (index, config) in work {
                    if is_cancelled(cancel) {
                        state.summary.cancelled = true;
                        break;
                    }
                    let outcome = self.simulate(&series, &bands, &config);
                    state.record(index, config, outcome, progress_cb);
                }
                if state.summary.cancelled {
                    break;
                }
            }

            std::thread::yield_now();
        }

        let report = state.finish(progress_cb);
        tracing::info!(
            simulated = report.summary.simulated,
            pruned = report.summary.pruned,
            failed = report.summary.failed,
            accepted = report.summary.accepted,
            cancelled = report.summary.cancelled,
            elapsed_secs = report.summary.elapsed_secs,
            "sweep finished"
        );
        Ok(report)
    }

    fn compute_bands(&self, candles: &[Candle], params: &BandParams) -> Result<BandSeries, String> {
        catch_unwind(AssertUnwindSafe(|| self.indicator.compute(candles, params)))
            .map(Arc::new)
            .map_err(panic_message)
    }

    fn simulate(
        &self,
        series: &CandleSeries,
        bands: &HashMap<BandKey, Result<BandSeries, String>>,
        config: &StrategyConfig,
    ) -> Outcome {
        let band_series = match bands.get(&band_key(&config.band)) {
            Some(Ok(series)) => Arc::clone(series),
            Some(Err(e)) => return Err(format!("band indicator failed: {e}")),
            None => return Err("band series missing".to_string()),
        };
        catch_unwind(AssertUnwindSafe(|| {
            run_backtest(series, &band_series, config, self.sink)
        }))
        .map_err(panic_message)
    }
}

/// Sequential sweep with the Bollinger indicator and default settings.
pub fn optimize_all(
    candles: &[Candle],
    base: &StrategyConfig,
    grid: &ParamGrid,
    filters: &OptimizationFilters,
) -> Result<OptimizationReport, OptimizeError> {
    Optimizer::new(&Bollinger).optimize_all(candles, base, grid, filters, None, None)
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

// ─── Accumulator ─────────────────────────────────────────────────────

struct SweepState<'f> {
    filters: &'f OptimizationFilters,
    max_results: Option<usize>,
    total: usize,
    started: Instant,
    summary: SweepSummary,
    results: Vec<OptimizationResult>,
    best: Option<OptimizationResult>,
    failures: Vec<FailedCombination>,
}

impl<'f> SweepState<'f> {
    fn new(
        raw: usize,
        total: usize,
        filters: &'f OptimizationFilters,
        max_results: Option<usize>,
    ) -> Self {
        Self {
            filters,
            max_results,
            total,
            started: Instant::now(),
            summary: SweepSummary {
                raw_combinations: raw,
                ..SweepSummary::default()
            },
            results: Vec::new(),
            best: None,
            failures: Vec::new(),
        }
    }

    fn processed(&self) -> usize {
        self.summary.simulated + self.summary.failed
    }

    fn record(
        &mut self,
        index: usize,
        config: StrategyConfig,
        outcome: Outcome,
        progress_cb: Option<&dyn Fn(&OptimizationProgress)>,
    ) {
        let label = config.describe();
        match outcome {
            Err(error) => {
                tracing::warn!(index, combination = %label, %error, "combination failed");
                self.summary.failed += 1;
                self.failures.push(FailedCombination {
                    index,
                    label: label.clone(),
                    error,
                });
            }
            Ok(result) => {
                self.summary.simulated += 1;
                match self.filters.check(&result) {
                    Err(rejection) => {
                        tracing::trace!(index, %rejection, "filtered out");
                        self.summary.filtered_out += 1;
                    }
                    Ok(()) => {
                        let accepted = OptimizationResult::new(index, config, &result);
                        let improves = self.best.as_ref().map_or(true, |best| {
                            OptimizationResult::rank_cmp(&accepted, best).is_lt()
                        });
                        if improves {
                            tracing::debug!(index, score = accepted.score, "new best");
                            self.best = Some(accepted.clone());
                        }
                        self.summary.accepted += 1;
                        self.results.push(accepted);
                        self.bound_results();
                    }
                }
            }
        }

        if let Some(cb) = progress_cb {
            cb(&self.progress(label, true));
        }
    }

    /// Keep memory bounded when only the top N are wanted.
    fn bound_results(&mut self) {
        if let Some(n) = self.max_results {
            if self.results.len() >= n.saturating_mul(2).max(64) {
                self.results.sort_by(OptimizationResult::rank_cmp);
                self.results.truncate(n);
            }
        }
    }

    fn progress(&self, description: String, running: bool) -> OptimizationProgress {
        let elapsed = self.started.elapsed().as_secs_f64();
        let processed = self.processed();
        let eta_secs = if processed > 0 {
            let per_combination = elapsed / processed as f64;
            Some(per_combination * self.total.saturating_sub(processed) as f64)
        } else {
            None
        };
        OptimizationProgress {
            current: processed,
            total: self.total,
            description,
            running,
            best: self.best.clone(),
            elapsed_secs: elapsed,
            eta_secs,
            accepted: self.summary.accepted,
            failed: self.summary.failed,
        }
    }

    fn finish(mut self, progress_cb: Option<&dyn Fn(&OptimizationProgress)>) -> OptimizationReport {
        self.results.sort_by(OptimizationResult::rank_cmp);
        if let Some(n) = self.max_results {
            self.results.truncate(n);
        }
        self.summary.elapsed_secs = self.started.elapsed().as_secs_f64();

        if let Some(cb) = progress_cb {
            let description = if self.summary.cancelled {
                "cancelled".to_string()
            } else {
                "complete".to_string()
            };
            cb(&self.progress(description, false));
        }

        OptimizationReport {
            results: self.results,
            summary: self.summary,
            failures: self.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::generate_synthetic_candles;
    use fibband_core::config::SignalFlags;
    use std::cell::RefCell;

    fn small_grid() -> ParamGrid {
        let base = StrategyConfig::default();
        let mut grid = ParamGrid::single(&base);
        grid.periods = vec![10, 20];
        grid.std_devs = vec![1.0, 2.0];
        grid.flag_sets = vec![SignalFlags {
            require_retracement: false,
            require_volume: false,
            ..SignalFlags::default()
        }];
        grid
    }

    #[test]
    fn empty_inputs_are_errors() {
        let base = StrategyConfig::default();
        let filters = OptimizationFilters::default();
        assert!(matches!(
            optimize_all(&[], &base, &small_grid(), &filters),
            Err(OptimizeError::NoCandles)
        ));

        let mut grid = small_grid();
        grid.periods.clear();
        let candles = generate_synthetic_candles("t", 100, 60_000);
        assert!(matches!(
            optimize_all(&candles, &base, &grid, &filters),
            Err(OptimizeError::EmptyGrid)
        ));

        let broke = StrategyConfig {
            initial_capital: 0.0,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            optimize_all(&candles, &broke, &small_grid(), &filters),
            Err(OptimizeError::InvalidCapital(_))
        ));
    }

    #[test]
    fn results_are_ranked() {
        let candles = generate_synthetic_candles("rank", 600, 60_000);
        let report = optimize_all(
            &candles,
            &StrategyConfig::default(),
            &small_grid(),
            &OptimizationFilters::default(),
        )
        .unwrap();
        assert_eq!(report.summary.simulated, 4);
        assert_eq!(report.results.len(), 4);
        for pair in report.results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                assert!(pair[0].index < pair[1].index);
            }
        }
        assert_eq!(report.best().map(|r| r.index), report.results.first().map(|r| r.index));
    }

    #[test]
    fn progress_is_published_per_combination() {
        let candles = generate_synthetic_candles("progress", 300, 60_000);
        let snapshots = RefCell::new(Vec::new());
        let cb = |p: &OptimizationProgress| snapshots.borrow_mut().push(p.clone());
        Optimizer::new(&Bollinger)
            .optimize_all(
                &candles,
                &StrategyConfig::default(),
                &small_grid(),
                &OptimizationFilters::default(),
                Some(&cb),
                None,
            )
            .unwrap();

        let snapshots = snapshots.into_inner();
        assert_eq!(snapshots.len(), 5);
        let currents: Vec<usize> = snapshots.iter().map(|p| p.current).collect();
        assert_eq!(currents, vec![1, 2, 3, 4, 4]);
        assert!(snapshots.iter().all(|p| p.total == 4));
        assert!(snapshots[..4].iter().all(|p| p.running));
        assert!(!snapshots[4].running);
        assert_eq!(snapshots[3].eta_secs, Some(0.0));
    }

    #[test]
    fn cancelled_before_start_returns_empty() {
        let candles = generate_synthetic_candles("cancel", 200, 60_000);
        let cancel = AtomicBool::new(true);
        let report = Optimizer::new(&Bollinger)
            .optimize_all(
                &candles,
                &StrategyConfig::default(),
                &small_grid(),
                &OptimizationFilters::default(),
                None,
                Some(&cancel),
            )
            .unwrap();
        assert!(report.summary.cancelled);
        assert_eq!(report.summary.simulated, 0);
        assert!(report.results.is_empty());
    }

    #[test]
    fn cancel_mid_sweep_keeps_partial_results() {
        let candles = generate_synthetic_candles("cancel-mid", 200, 60_000);
        let cancel = AtomicBool::new(false);
        let cb = |p: &OptimizationProgress| {
            if p.current == 2 {
                cancel.store(true, Ordering::Relaxed);
            }
        };
        let report = Optimizer::new(&Bollinger)
            .optimize_all(
                &candles,
                &StrategyConfig::default(),
                &small_grid(),
                &OptimizationFilters::default(),
                Some(&cb),
                Some(&cancel),
            )
            .unwrap();
        assert!(report.summary.cancelled);
        assert_eq!(report.summary.simulated, 2);
    }

    struct PanicsOnPeriod(usize);

    impl BandIndicator for PanicsOnPeriod {
        fn name(&self) -> &str {
            "panics"
        }

        fn compute(&self, candles: &[Candle], params: &BandParams) -> Vec<Option<BandValue>> {
            if params.period == self.0 {
                panic!("period {} unsupported", self.0);
            }
            Bollinger.compute(candles, params)
        }
    }

    #[test]
    fn failing_combination_does_not_abort_sweep() {
        let candles = generate_synthetic_candles("panic", 200, 60_000);
        let indicator = PanicsOnPeriod(10);
        let report = Optimizer::new(&indicator)
            .optimize_all(
                &candles,
                &StrategyConfig::default(),
                &small_grid(),
                &OptimizationFilters::default(),
                None,
                None,
            )
            .unwrap();
        assert_eq!(report.summary.failed, 2);
        assert_eq!(report.summary.simulated, 2);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].error.contains("unsupported"));
        assert!(report.results.iter().all(|r| r.config.band.period == 20));
    }

    #[test]
    fn max_results_truncates() {
        let candles = generate_synthetic_candles("top", 300, 60_000);
        let config = OptimizerConfig {
            max_results: Some(1),
            ..OptimizerConfig::default()
        };
        let report = Optimizer::new(&Bollinger)
            .with_config(config)
            .optimize_all(
                &candles,
                &StrategyConfig::default(),
                &small_grid(),
                &OptimizationFilters::default(),
                None,
                None,
            )
            .unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.summary.accepted, 4);
        assert_eq!(report.top_n(10).len(), 1);
    }
}
