//! Integration tests for the grid optimizer.
//!
//! Runs real sweeps over synthetic candles: pruning accounting, filter law,
//! determinism, sequential/parallel equivalence and a sweep file round trip.

use std::sync::atomic::{AtomicUsize, Ordering};

use fibband_core::config::{SignalFlags, StrategyConfig};
use fibband_core::domain::Candle;
use fibband_core::indicators::Bollinger;
use fibband_runner::{
    generate_synthetic_candles, optimize_all, OptimizationFilters, OptimizationProgress,
    Optimizer, OptimizerConfig, ParamGrid, SweepFile,
};

fn candles(label: &str) -> Vec<Candle> {
    generate_synthetic_candles(label, 800, 60_000)
}

fn loose_flags() -> SignalFlags {
    SignalFlags {
        require_retracement: false,
        require_volume: false,
        ..SignalFlags::default()
    }
}

/// 10 periods × 2 widths, with one inverted golden-zone pair mixed in.
fn scenario_grid() -> ParamGrid {
    let mut grid = ParamGrid::single(&StrategyConfig::default());
    grid.periods = (1..=10).map(|i| i * 5).collect();
    grid.std_devs = vec![1.5, 2.0];
    grid.golden_zone_mins = vec![0.5, 0.618];
    grid.golden_zone_maxes = vec![0.618];
    grid.flag_sets = vec![loose_flags()];
    grid
}

#[test]
fn pruned_combinations_are_never_simulated() {
    let grid = scenario_grid();
    let report = optimize_all(
        &candles("prune"),
        &StrategyConfig::default(),
        &grid,
        &OptimizationFilters::default(),
    )
    .unwrap();

    let s = &report.summary;
    assert_eq!(s.raw_combinations, 40);
    assert_eq!(s.pruned, 20);
    assert_eq!(s.simulated + s.failed, s.raw_combinations - s.pruned);
    assert_eq!(s.simulated, grid.surviving_size(1.2));
    assert!(!s.cancelled);

    for r in &report.results {
        assert!(r.config.golden_zone_min < r.config.golden_zone_max);
        assert!(r.config.profit_target / r.config.stop_loss >= 1.2);
    }
}

#[test]
fn non_positive_grid_values_are_never_simulated() {
    let mut grid = ParamGrid::single(&StrategyConfig::default());
    grid.leverages = vec![-2.0, 0.0, 1.0];
    grid.stop_losses = vec![0.0, 0.02];
    grid.max_holdings = vec![0, 60];
    grid.flag_sets = vec![loose_flags()];

    let report = optimize_all(
        &candles("invalid"),
        &StrategyConfig::default(),
        &grid,
        &OptimizationFilters::default(),
    )
    .unwrap();

    assert_eq!(report.summary.raw_combinations, 12);
    assert_eq!(report.summary.pruned, 11);
    assert_eq!(report.summary.simulated, 1);
    assert_eq!(grid.surviving_size(1.2), 1);
    for r in &report.results {
        assert_eq!(r.config.validate(), Ok(()));
        assert_eq!(r.config.leverage, 1.0);
        assert_eq!(r.config.stop_loss, 0.02);
        assert_eq!(r.config.max_holding, 60);
    }
}

#[test]
fn reward_risk_pruning_uses_configured_minimum() {
    let mut grid = ParamGrid::single(&StrategyConfig::default());
    grid.profit_targets = vec![0.02, 0.03, 0.05];
    grid.stop_losses = vec![0.02];
    grid.flag_sets = vec![loose_flags()];

    let run = |min_reward_risk: f64| {
        Optimizer::new(&Bollinger)
            .with_config(OptimizerConfig {
                min_reward_risk,
                ..OptimizerConfig::default()
            })
            .optimize_all(
                &candles("rr"),
                &StrategyConfig::default(),
                &grid,
                &OptimizationFilters::default(),
                None,
                None,
            )
            .unwrap()
            .summary
    };

    // ratios 1.0, 1.5, 2.5
    assert_eq!(run(1.2).simulated, 2);
    assert_eq!(run(2.0).simulated, 1);
}

#[test]
fn every_result_satisfies_the_filters() {
    let filters = OptimizationFilters {
        min_trades: Some(2),
        min_win_rate: Some(0.3),
        max_drawdown: Some(0.5),
        min_return: Some(-0.5),
        ..OptimizationFilters::default()
    };
    let report = optimize_all(
        &candles("filters"),
        &StrategyConfig::default(),
        &scenario_grid(),
        &filters,
    )
    .unwrap();

    assert_eq!(
        report.summary.accepted + report.summary.filtered_out,
        report.summary.simulated
    );
    for r in &report.results {
        assert!(r.total_trades >= 2);
        assert!(r.win_rate >= 0.3);
        assert!(r.max_drawdown <= 0.5);
        assert!(r.total_return >= -0.5);
    }
}

#[test]
fn impossible_filters_give_an_empty_ranking() {
    let filters = OptimizationFilters {
        min_trades: Some(1_000_000),
        ..OptimizationFilters::default()
    };
    let report = optimize_all(
        &candles("none"),
        &StrategyConfig::default(),
        &scenario_grid(),
        &filters,
    )
    .unwrap();
    assert!(report.results.is_empty());
    assert!(report.best().is_none());
    assert_eq!(report.summary.filtered_out, report.summary.simulated);
}

#[test]
fn rerun_is_identical() {
    let data = candles("determinism");
    let base = StrategyConfig::default();
    let filters = OptimizationFilters::default();
    let a = optimize_all(&data, &base, &scenario_grid(), &filters).unwrap();
    let b = optimize_all(&data, &base, &scenario_grid(), &filters).unwrap();
    assert_eq!(a.results, b.results);
    assert_eq!(a.summary.simulated, b.summary.simulated);
}

#[test]
fn parallel_matches_sequential() {
    let data = candles("parallel");
    let base = StrategyConfig::default();
    let filters = OptimizationFilters::default();
    let settings = OptimizerConfig {
        yield_every: 7,
        ..OptimizerConfig::default()
    };

    let sequential = Optimizer::new(&Bollinger)
        .with_config(settings.clone())
        .optimize_all(&data, &base, &scenario_grid(), &filters, None, None)
        .unwrap();
    let parallel = Optimizer::new(&Bollinger)
        .with_config(OptimizerConfig {
            threads: Some(2),
            ..settings
        })
        .with_parallelism(true)
        .optimize_all(&data, &base, &scenario_grid(), &filters, None, None)
        .unwrap();

    assert_eq!(sequential.results, parallel.results);
    assert_eq!(sequential.summary.pruned, parallel.summary.pruned);
}

#[test]
fn parallel_progress_stays_monotonic() {
    let seen = AtomicUsize::new(0);
    let cb = |p: &OptimizationProgress| {
        let previous = seen.swap(p.current, Ordering::SeqCst);
        assert!(p.current >= previous);
        assert!(p.current <= p.total);
    };
    let report = Optimizer::new(&Bollinger)
        .with_parallelism(true)
        .optimize_all(
            &candles("progress"),
            &StrategyConfig::default(),
            &scenario_grid(),
            &OptimizationFilters::default(),
            Some(&cb),
            None,
        )
        .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), report.summary.simulated);
}

#[test]
fn best_result_carries_its_parameters() {
    let report = optimize_all(
        &candles("best"),
        &StrategyConfig::default(),
        &scenario_grid(),
        &OptimizationFilters::default(),
    )
    .unwrap();
    let best = report.best().unwrap();
    assert_eq!(best.label, best.config.describe());
    assert_eq!(best.fingerprint.len(), 64);
    assert!((0.0..=100.0).contains(&best.score));
    assert_eq!(best.score, best.breakdown.composite);
    assert!(report.results.iter().all(|r| r.score <= best.score));
}

#[test]
fn sweep_file_drives_a_run() {
    let toml = r#"
        [base]
        initial_capital = 5000.0

        [grid]
        periods = [10, 20]
        std_devs = [2.0]
        offsets = [0]
        swing_lookbacks = [5]
        golden_zone_mins = [0.5]
        golden_zone_maxes = [0.618]
        profit_targets = [0.03]
        stop_losses = [0.02]
        max_holdings = [60]
        leverages = [1.0]
        volume_thresholds = [1.5]

        [optimizer]
        max_results = 3
    "#;
    let sweep = SweepFile::from_toml_str(toml).unwrap();
    assert_eq!(sweep.grid.raw_size(), 2 * sweep.grid.flag_sets.len());

    let report = Optimizer::new(&Bollinger)
        .with_config(sweep.optimizer.clone())
        .optimize_all(
            &candles("sweep-file"),
            &sweep.base,
            &sweep.grid,
            &sweep.filters,
            None,
            None,
        )
        .unwrap();
    assert!(report.results.len() <= 3);
    assert!(report
        .results
        .iter()
        .all(|r| r.config.initial_capital == 5000.0));
}
