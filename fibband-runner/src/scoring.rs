//! Composite score: seven normalized components blended with fixed weights.
//!
//! Each component is mapped into [0, 100] before weighting, so the composite
//! is also in [0, 100].

use serde::{Deserialize, Serialize};

use fibband_core::config::StrategyConfig;
use fibband_core::engine::BacktestResult;

pub const RETURN_WEIGHT: f64 = 0.25;
pub const WIN_RATE_WEIGHT: f64 = 0.20;
pub const SHARPE_WEIGHT: f64 = 0.15;
pub const DRAWDOWN_WEIGHT: f64 = 0.15;
pub const TRADE_COUNT_WEIGHT: f64 = 0.10;
pub const SIGNAL_QUALITY_WEIGHT: f64 = 0.10;
pub const SPEED_WEIGHT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub return_score: f64,
    pub win_rate_score: f64,
    pub sharpe_score: f64,
    pub drawdown_score: f64,
    pub trade_count_score: f64,
    pub signal_quality_score: f64,
    pub speed_score: f64,
    pub composite: f64,
}

impl ScoreBreakdown {
    pub fn compute(result: &BacktestResult, config: &StrategyConfig) -> Self {
        let return_score = clamp_score((result.total_return + 1.0) * 50.0);
        let win_rate_score = clamp_score(result.win_rate * 100.0);
        let sharpe_score = clamp_score((result.sharpe_ratio + 2.5) * 20.0);
        let drawdown_score = clamp_score(100.0 - result.max_drawdown * 100.0);
        let trade_count_score = clamp_score(result.total_trades as f64 * 2.0);
        let signal_quality_score = clamp_score(result.avg_signal_strength);

        let max_hold_ms = config.max_holding as f64 * result.timeframe.unit_ms() as f64;
        let speed_score = if result.total_trades == 0 || max_hold_ms <= 0.0 {
            0.0
        } else {
            clamp_score(100.0 * (1.0 - result.avg_trade_duration_ms / max_hold_ms))
        };

        let composite = return_score * RETURN_WEIGHT
            + win_rate_score * WIN_RATE_WEIGHT
            + sharpe_score * SHARPE_WEIGHT
            + drawdown_score * DRAWDOWN_WEIGHT
            + trade_count_score * TRADE_COUNT_WEIGHT
            + signal_quality_score * SIGNAL_QUALITY_WEIGHT
            + speed_score * SPEED_WEIGHT;

        Self {
            return_score,
            win_rate_score,
            sharpe_score,
            drawdown_score,
            trade_count_score,
            signal_quality_score,
            speed_score,
            composite,
        }
    }
}

/// Clamp into [0, 100]; non-finite input scores 0.
fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
