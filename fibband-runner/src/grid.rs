//! Parameter grid for the optimizer.
//!
//! One vector per tunable dimension. The grid is never materialized: a
//! combination index is decoded into a [`StrategyConfig`] by mixed-radix
//! arithmetic, with the last dimension varying fastest (the same order as
//! nested loops over the fields in declaration order).

use serde::{Deserialize, Serialize};

use fibband_core::config::{BandParams, ConfigError, SignalFlags, StrategyConfig};

/// Why a combination is skipped without simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum PruneReason {
    /// Golden zone is not `0 <= min < max <= 1`.
    GoldenZone,
    /// A non-positive or non-finite range, zero period or zero holding.
    Invalid(ConfigError),
    /// Profit target / stop loss does not exceed the minimum.
    RewardRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    // ── Bands ──
    pub periods: Vec<usize>,
    pub std_devs: Vec<f64>,
    pub offsets: Vec<usize>,

    // ── Swings / zone ──
    pub swing_lookbacks: Vec<usize>,
    pub golden_zone_mins: Vec<f64>,
    pub golden_zone_maxes: Vec<f64>,

    // ── Exits ──
    pub profit_targets: Vec<f64>,
    pub stop_losses: Vec<f64>,
    pub max_holdings: Vec<u64>,

    // ── Sizing / gates ──
    pub leverages: Vec<f64>,
    pub volume_thresholds: Vec<f64>,
    pub flag_sets: Vec<SignalFlags>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self::default_ranges()
    }
}

impl ParamGrid {
    /// Curated search ranges.
    pub fn default_ranges() -> Self {
        Self {
            periods: vec![10, 14, 20, 26, 30],
            std_devs: vec![1.5, 2.0, 2.5],
            offsets: vec![0],
            swing_lookbacks: vec![3, 5, 8],
            golden_zone_mins: vec![0.382, 0.5],
            golden_zone_maxes: vec![0.618, 0.786],
            profit_targets: vec![0.01, 0.02, 0.03, 0.05],
            stop_losses: vec![0.005, 0.01, 0.02],
            max_holdings: vec![15, 30, 60, 120],
            leverages: vec![1.0, 2.0, 5.0],
            volume_thresholds: vec![1.2, 1.5, 2.0],
            flag_sets: Self::curated_flag_sets(),
        }
    }

    /// Every gate on; volume bypassed; retracement bypassed; long only.
    pub fn curated_flag_sets() -> Vec<SignalFlags> {
        let all = SignalFlags::default();
        vec![
            all,
            SignalFlags {
                require_volume: false,
                ..all
            },
            SignalFlags {
                require_retracement: false,
                ..all
            },
            SignalFlags {
                enable_short: false,
                ..all
            },
        ]
    }

    /// A one-combination grid holding exactly `base`.
    pub fn single(base: &StrategyConfig) -> Self {
        Self {
            periods: vec![base.band.period],
            std_devs: vec![base.band.std_dev],
            offsets: vec![base.band.offset],
            swing_lookbacks: vec![base.swing_lookback],
            golden_zone_mins: vec![base.golden_zone_min],
            golden_zone_maxes: vec![base.golden_zone_max],
            profit_targets: vec![base.profit_target],
            stop_losses: vec![base.stop_loss],
            max_holdings: vec![base.max_holding],
            leverages: vec![base.leverage],
            volume_thresholds: vec![base.volume_threshold],
            flag_sets: vec![base.flags],
        }
    }

    /// Dimension lengths in decoding order.
    fn radices(&self) -> [usize; 12] {
        [
            self.periods.len(),
            self.std_devs.len(),
            self.offsets.len(),
            self.swing_lookbacks.len(),
            self.golden_zone_mins.len(),
            self.golden_zone_maxes.len(),
            self.profit_targets.len(),
            self.stop_losses.len(),
            self.max_holdings.len(),
            self.leverages.len(),
            self.volume_thresholds.len(),
            self.flag_sets.len(),
        ]
    }

    /// Size of the full Cartesian product (saturating).
    pub fn raw_size(&self) -> usize {
        self.radices()
            .iter()
            .fold(1usize, |acc, &n| acc.saturating_mul(n))
    }

    /// Number of combinations [`prune_reason`] lets through, counted without
    /// enumerating. Assumes a base with positive initial capital.
    pub fn surviving_size(&self, min_reward_risk: f64) -> usize {
        let zones = self
            .golden_zone_mins
            .iter()
            .flat_map(|&min| self.golden_zone_maxes.iter().map(move |&max| (min, max)))
            .filter(|&(min, max)| zone_is_ordered(min, max))
            .count();
        let exits = self
            .profit_targets
            .iter()
            .flat_map(|&tp| self.stop_losses.iter().map(move |&sl| (tp, sl)))
            .filter(|&(tp, sl)| {
                is_positive(tp) && is_positive(sl) && reward_risk_ok(tp, sl, min_reward_risk)
            })
            .count();

        [
            self.periods.iter().filter(|&&p| p > 0).count(),
            count_positive(&self.std_devs),
            self.offsets.len(),
            self.swing_lookbacks.len(),
            zones,
            exits,
            self.max_holdings.iter().filter(|&&h| h > 0).count(),
            count_positive(&self.leverages),
            count_positive(&self.volume_thresholds),
            self.flag_sets.len(),
        ]
        .iter()
        .fold(1usize, |acc, &n| acc.saturating_mul(n))
    }

    /// Decode combination `index` onto `base` (`initial_capital` is kept from
    /// `base`). Returns `None` when `index >= raw_size()`.
    pub fn config_at(&self, index: usize, base: &StrategyConfig) -> Option<StrategyConfig> {
        if index >= self.raw_size() {
            return None;
        }
        let radices = self.radices();
        let mut digits = [0usize; 12];
        let mut rest = index;
        for (digit, &radix) in digits.iter_mut().zip(radices.iter()).rev() {
            *digit = rest % radix;
            rest /= radix;
        }
        let [period, std_dev, offset, lookback, zmin, zmax, tp, sl, hold, lev, vol, flags] = digits;

        Some(StrategyConfig {
            band: BandParams {
                period: self.periods[period],
                std_dev: self.std_devs[std_dev],
                offset: self.offsets[offset],
            },
            swing_lookback: self.swing_lookbacks[lookback],
            golden_zone_min: self.golden_zone_mins[zmin],
            golden_zone_max: self.golden_zone_maxes[zmax],
            profit_target: self.profit_targets[tp],
            stop_loss: self.stop_losses[sl],
            max_holding: self.max_holdings[hold],
            leverage: self.leverages[lev],
            volume_threshold: self.volume_thresholds[vol],
            flags: self.flag_sets[flags],
            initial_capital: base.initial_capital,
        })
    }
}

/// Pruning rules applied before simulation, in order: golden zone,
/// structural validity, reward/risk floor.
pub fn prune_reason(config: &StrategyConfig, min_reward_risk: f64) -> Option<PruneReason> {
    if !zone_is_ordered(config.golden_zone_min, config.golden_zone_max) {
        return Some(PruneReason::GoldenZone);
    }
    if let Err(e) = config.validate() {
        return Some(PruneReason::Invalid(e));
    }
    if !reward_risk_ok(config.profit_target, config.stop_loss, min_reward_risk) {
        return Some(PruneReason::RewardRisk);
    }
    None
}

fn zone_is_ordered(min: f64, max: f64) -> bool {
    StrategyConfig {
        golden_zone_min: min,
        golden_zone_max: max,
        ..StrategyConfig::default()
    }
    .golden_zone_is_ordered()
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn count_positive(values: &[f64]) -> usize {
    values.iter().filter(|&&v| is_positive(v)).count()
}

fn reward_risk_ok(profit_target: f64, stop_loss: f64, minimum: f64) -> bool {
    StrategyConfig {
        profit_target,
        stop_loss,
        ..StrategyConfig::default()
    }
    .check_reward_risk(minimum)
    .is_ok()
}
