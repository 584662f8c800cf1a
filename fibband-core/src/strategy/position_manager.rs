//! Position manager — the Flat → Open → Flat state machine.
//!
//! Owns at most one open [`Trade`]. Capital compounds: each realized PnL is
//! added to running capital on exit, and the next entry commits the updated
//! amount.

use crate::config::StrategyConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::domain::{BandValue, Candle, Direction, ExitReason, Signal, Trade};

/// Signals below this strength are ignored.
pub const MIN_ACTIONABLE_STRENGTH: f64 = 70.0;

#[derive(Debug, Clone, PartialEq)]
pub enum PositionState {
    Flat,
    Open(Trade),
}

#[derive(Debug, Clone)]
pub struct PositionManager {
    // ── Policy ──
    profit_target: f64,
    leverage: f64,
    max_holding: u64,
    enable_long: bool,
    enable_short: bool,

    // ── State ──
    capital: f64,
    state: PositionState,
    trades: Vec<Trade>,
    next_id: u64,
}

impl PositionManager {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            profit_target: config.profit_target,
            leverage: config.leverage,
            max_holding: config.max_holding,
            enable_long: config.flags.enable_long,
            enable_short: config.flags.enable_short,
            capital: config.initial_capital,
            state: PositionState::Flat,
            trades: Vec::new(),
            next_id: 1,
        }
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn open_trade(&self) -> Option<&Trade> {
        match &self.state {
            PositionState::Open(trade) => Some(trade),
            PositionState::Flat => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PositionState::Open(_))
    }

    /// Closed trades in exit order.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    fn direction_enabled(&self, direction: Direction) -> bool {
        match direction {
            Direction::Long => self.enable_long,
            Direction::Short => self.enable_short,
        }
    }

    /// Open a position from `signal` if flat, the signal is actionable, the
    /// direction is enabled and capital remains. Returns whether it opened.
    ///
    /// The capital check pairs with the liquidation floor in
    /// [`realized_pnl`](crate::domain::trade::realized_pnl): once a loss has
    /// consumed all capital the run stops trading instead of carrying a
    /// negative balance.
    pub fn try_open(
        &mut self,
        signal: &Signal,
        index: usize,
        timestamp: i64,
        sink: &dyn DiagnosticSink,
    ) -> bool {
        if self.is_open()
            || signal.strength < MIN_ACTIONABLE_STRENGTH
            || !self.direction_enabled(signal.direction)
            || self.capital <= 0.0
        {
            return false;
        }

        let trade = Trade {
            id: self.next_id,
            direction: signal.direction,
            entry_index: index,
            entry_time: timestamp,
            entry_price: signal.entry_price,
            stop_price: signal.stop_price,
            target_price: signal.target_price,
            leverage: self.leverage,
            capital_at_entry: self.capital,
            signal_strength: signal.strength,
            open: true,
            exit_index: None,
            exit_time: None,
            exit_price: None,
            pnl: None,
            exit_reason: None,
        };
        self.next_id += 1;

        sink.emit(&Diagnostic::PositionOpened {
            trade_id: trade.id,
            index,
            direction: trade.direction,
            price: trade.entry_price,
            strength: trade.signal_strength,
        });
        self.state = PositionState::Open(trade);
        true
    }

    /// Whether a position held for `held` units has reached max holding.
    pub fn timed_out(&self, held: u64) -> bool {
        self.is_open() && held >= self.max_holding
    }

    /// Take-profit price for the open trade, recomputed from its entry price
    /// and the configured target rather than read from the trade.
    pub fn target_price(&self, trade: &Trade) -> f64 {
        match trade.direction {
            Direction::Long => trade.entry_price * (1.0 + self.profit_target),
            Direction::Short => trade.entry_price * (1.0 - self.profit_target),
        }
    }

    /// First exit condition that fires on `candle`: stop-loss, then target,
    /// then reversal (skipped without a band). Returns the reason and fill price.
    pub fn check_exit(
        &self,
        candle: &Candle,
        band: Option<&BandValue>,
    ) -> Option<(ExitReason, f64)> {
        let trade = self.open_trade()?;
        let target = self.target_price(trade);

        let (stopped, hit_target) = match trade.direction {
            Direction::Long => (candle.low <= trade.stop_price, candle.high >= target),
            Direction::Short => (candle.high >= trade.stop_price, candle.low <= target),
        };
        if stopped {
            return Some((ExitReason::StopLoss, trade.stop_price));
        }
        if hit_target {
            return Some((ExitReason::TakeProfit, target));
        }

        let band = band?;
        let reversed = match trade.direction {
            Direction::Long => candle.close <= band.upper,
            Direction::Short => candle.close >= band.lower,
        };
        reversed.then_some((ExitReason::Reversal, candle.close))
    }

    /// Close the open position and book its PnL into capital.
    /// Returns the PnL, or `None` when flat.
    pub fn close(
        &mut self,
        index: usize,
        timestamp: i64,
        price: f64,
        reason: ExitReason,
        sink: &dyn DiagnosticSink,
    ) -> Option<f64> {
        let PositionState::Open(mut trade) = std::mem::replace(&mut self.state, PositionState::Flat)
        else {
            return None;
        };
        let pnl = trade.close(index, timestamp, price, reason);
        self.capital += pnl;
        sink.emit(&Diagnostic::PositionClosed {
            trade_id: trade.id,
            index,
            reason,
            price,
            pnl,
        });
        self.trades.push(trade);
        Some(pnl)
    }
}
