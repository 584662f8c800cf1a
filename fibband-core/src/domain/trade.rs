//! Trade — one position from entry to exit.

use super::signal::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Timeout,
    Reversal,
    /// Still open on the final candle and closed there.
    StrategyExit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StopLoss => "stop-loss",
            Self::TakeProfit => "take-profit",
            Self::Timeout => "timeout",
            Self::Reversal => "reversal",
            Self::StrategyExit => "strategy-exit",
        };
        f.write_str(s)
    }
}

/// A trade record. Created open on entry, closed exactly once, then frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub id: u64,
    pub direction: Direction,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_time: i64,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub leverage: f64,
    pub capital_at_entry: f64,
    pub signal_strength: f64,

    // ── Exit ──
    pub open: bool,
    pub exit_index: Option<usize>,
    pub exit_time: Option<i64>,
    pub exit_price: Option<f64>,
    pub pnl: Option<f64>,
    pub exit_reason: Option<ExitReason>,
}

impl Trade {
    /// Close the trade and return its realized PnL.
    ///
    /// PnL is `(exit - entry) / entry * leverage * capital_at_entry`, sign-flipped
    /// for shorts, and never below `-capital_at_entry`. Closing an already
    /// closed trade is a no-op returning the recorded PnL.
    pub fn close(&mut self, index: usize, time: i64, price: f64, reason: ExitReason) -> f64 {
        if !self.open {
            return self.pnl.unwrap_or(0.0);
        }
        let pnl = realized_pnl(
            self.direction,
            self.entry_price,
            price,
            self.leverage,
            self.capital_at_entry,
        );
        self.open = false;
        self.exit_index = Some(index);
        self.exit_time = Some(time);
        self.exit_price = Some(price);
        self.pnl = Some(pnl);
        self.exit_reason = Some(reason);
        pnl
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Realized return as a fraction of the capital committed at entry.
    pub fn return_pct(&self) -> f64 {
        match self.pnl {
            Some(pnl) if self.capital_at_entry > 0.0 => pnl / self.capital_at_entry,
            _ => 0.0,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl.is_some_and(|p| p > 0.0)
    }

    /// Milliseconds between entry and exit (0 while open).
    pub fn duration_ms(&self) -> i64 {
        self.exit_time
            .map(|t| (t - self.entry_time).max(0))
            .unwrap_or(0)
    }
}

/// Leveraged PnL with a liquidation floor at the committed capital.
///
/// Departs from the unbounded `(exit - entry) / entry * leverage * capital`
/// on purpose: a trade can lose at most the capital it committed, so the
/// equity curve never goes below zero and drawdown stays within [0, 1].
/// Above the floor the two agree exactly.
pub fn realized_pnl(
    direction: Direction,
    entry: f64,
    exit: f64,
    leverage: f64,
    capital: f64,
) -> f64 {
    if entry <= 0.0 || !exit.is_finite() {
        return 0.0;
    }
    let raw = (exit - entry) / entry * leverage * capital * direction.sign();
    raw.max(-capital.max(0.0))
}
