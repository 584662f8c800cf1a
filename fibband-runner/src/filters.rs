//! Post-simulation acceptance filters.

use serde::{Deserialize, Serialize};
use std::fmt;

use fibband_core::engine::BacktestResult;

/// Optional thresholds; a `None` field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationFilters {
    pub min_trading_days: Option<f64>,
    pub min_trades: Option<usize>,
    pub min_win_rate: Option<f64>,
    /// Largest acceptable drawdown as a fraction (0.2 = 20%).
    pub max_drawdown: Option<f64>,
    /// Smallest acceptable `total_pnl / initial_capital`.
    pub min_return: Option<f64>,
}

/// The first filter a result failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterRejection {
    TradingDays { actual: f64, minimum: f64 },
    Trades { actual: usize, minimum: usize },
    WinRate { actual: f64, minimum: f64 },
    Drawdown { actual: f64, maximum: f64 },
    Return { actual: f64, minimum: f64 },
}

impl fmt::Display for FilterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TradingDays { actual, minimum } => {
                write!(f, "trading period {actual:.2}d < {minimum}d")
            }
            Self::Trades { actual, minimum } => write!(f, "{actual} trades < {minimum}"),
            Self::WinRate { actual, minimum } => write!(f, "win rate {actual:.3} < {minimum}"),
            Self::Drawdown { actual, maximum } => write!(f, "drawdown {actual:.3} > {maximum}"),
            Self::Return { actual, minimum } => write!(f, "return {actual:.4} < {minimum}"),
        }
    }
}

impl OptimizationFilters {
    /// Check every supplied threshold; all must hold.
    pub fn check(&self, result: &BacktestResult) -> Result<(), FilterRejection> {
        if let Some(minimum) = self.min_trading_days {
            if result.trading_period_days < minimum {
                return Err(FilterRejection::TradingDays {
                    actual: result.trading_period_days,
                    minimum,
                });
            }
        }
        if let Some(minimum) = self.min_trades {
            if result.total_trades < minimum {
                return Err(FilterRejection::Trades {
                    actual: result.total_trades,
                    minimum,
                });
            }
        }
        if let Some(minimum) = self.min_win_rate {
            if result.win_rate < minimum {
                return Err(FilterRejection::WinRate {
                    actual: result.win_rate,
                    minimum,
                });
            }
        }
        if let Some(maximum) = self.max_drawdown {
            if result.max_drawdown > maximum {
                return Err(FilterRejection::Drawdown {
                    actual: result.max_drawdown,
                    maximum,
                });
            }
        }
        if let Some(minimum) = self.min_return {
            if result.total_return < minimum {
                return Err(FilterRejection::Return {
                    actual: result.total_return,
                    minimum,
                });
            }
        }
        Ok(())
    }

    pub fn passes(&self, result: &BacktestResult) -> bool {
        self.check(result).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
