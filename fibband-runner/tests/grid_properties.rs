//! Property tests for grid decoding and pruning.

use proptest::prelude::*;

use fibband_core::config::StrategyConfig;
use fibband_runner::{prune_reason, ParamGrid};

fn arb_grid() -> impl Strategy<Value = ParamGrid> {
    (
        prop::collection::vec(0usize..60, 1..4),
        prop::collection::vec(0.5f64..3.0, 1..3),
        prop::collection::vec(0.0f64..1.0, 1..4),
        prop::collection::vec(0.0f64..1.0, 1..4),
        prop::collection::vec(0.005f64..0.1, 1..4),
        prop::collection::vec(prop_oneof![Just(0.0f64), 0.005f64..0.1], 1..4),
        prop::collection::vec(prop_oneof![Just(-1.0f64), Just(0.0f64), 0.5f64..5.0], 1..3),
        prop::collection::vec(0u64..3, 1..3),
    )
        .prop_map(|(periods, std_devs, mins, maxes, targets, stops, leverages, holds)| {
            let mut grid = ParamGrid::single(&StrategyConfig::default());
            grid.periods = periods;
            grid.std_devs = std_devs;
            grid.golden_zone_mins = mins;
            grid.golden_zone_maxes = maxes;
            grid.profit_targets = targets;
            grid.stop_losses = stops;
            grid.leverages = leverages;
            grid.max_holdings = holds;
            grid
        })
}

proptest! {
    #[test]
    fn surviving_size_counts_unpruned_combinations(grid in arb_grid()) {
        let base = StrategyConfig::default();
        let survivors = (0..grid.raw_size())
            .filter_map(|i| grid.config_at(i, &base))
            .filter(|c| prune_reason(c, 1.2).is_none())
            .count();
        prop_assert_eq!(survivors, grid.surviving_size(1.2));
    }

    #[test]
    fn survivors_obey_pruning_rules(grid in arb_grid()) {
        let base = StrategyConfig::default();
        for config in (0..grid.raw_size()).filter_map(|i| grid.config_at(i, &base)) {
            if prune_reason(&config, 1.2).is_none() {
                prop_assert!(config.golden_zone_min < config.golden_zone_max);
                prop_assert!(config.profit_target / config.stop_loss > 1.2);
                prop_assert!(config.validate().is_ok());
            }
        }
    }

    #[test]
    fn every_index_decodes_to_grid_values(grid in arb_grid()) {
        let base = StrategyConfig::default();
        for i in 0..grid.raw_size() {
            let config = grid.config_at(i, &base).unwrap();
            prop_assert!(grid.periods.contains(&config.band.period));
            prop_assert!(grid.std_devs.contains(&config.band.std_dev));
            prop_assert!(grid.profit_targets.contains(&config.profit_target));
        }
        prop_assert!(grid.config_at(grid.raw_size(), &base).is_none());
    }
}
