//! Signal evaluator — four entry gates combined into a directional signal.
//!
//! Gates (each bypassed, i.e. counted as passing, when its requirement flag is off):
//! - Breakout: close moves from inside to outside the band since the previous candle
//! - Retracement: close sits in the golden zone
//! - Volume: volume > volume MA * threshold
//! - Momentum: close beyond open and beyond the previous close in the signal direction
//!
//! A signal is emitted only when all four gates pass. Long is evaluated before
//! short, and the first qualifying direction wins.

use crate::config::{SignalFlags, StrategyConfig};
use crate::domain::{BandValue, Candle, Direction, GateFlags, Signal};

use super::retracement::RetracementCalculator;

/// Everything the evaluator needs for one candle.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub candle: &'a Candle,
    pub prev_candle: &'a Candle,
    pub band: &'a BandValue,
    pub prev_band: &'a BandValue,
    pub volume_ma: Option<f64>,
    pub levels: &'a RetracementCalculator,
}

#[derive(Debug, Clone)]
pub struct SignalEvaluator {
    flags: SignalFlags,
    volume_threshold: f64,
    profit_target: f64,
    stop_loss: f64,
}

impl SignalEvaluator {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            flags: config.flags,
            volume_threshold: config.volume_threshold,
            profit_target: config.profit_target,
            stop_loss: config.stop_loss,
        }
    }

    /// Evaluate enabled directions, long first.
    pub fn evaluate(&self, ctx: &SignalContext<'_>) -> Option<Signal> {
        if self.flags.enable_long {
            if let Some(signal) = self.evaluate_direction(ctx, Direction::Long) {
                return Some(signal);
            }
        }
        if self.flags.enable_short {
            return self.evaluate_direction(ctx, Direction::Short);
        }
        None
    }

    /// Evaluate one direction regardless of whether it is enabled.
    pub fn evaluate_direction(&self, ctx: &SignalContext<'_>, direction: Direction) -> Option<Signal> {
        let gates = self.gates(ctx, direction);
        if !gates.all() {
            return None;
        }

        let entry = ctx.candle.close;
        let (stop_price, target_price) = match direction {
            Direction::Long => (
                entry * (1.0 - self.stop_loss),
                entry * (1.0 + self.profit_target),
            ),
            Direction::Short => (
                entry * (1.0 + self.stop_loss),
                entry * (1.0 - self.profit_target),
            ),
        };

        Some(Signal {
            direction,
            strength: gates.strength(),
            gates,
            entry_price: entry,
            stop_price,
            target_price,
        })
    }

    /// Gate outcomes for one direction; bypassed gates report `true`.
    pub fn gates(&self, ctx: &SignalContext<'_>, direction: Direction) -> GateFlags {
        GateFlags {
            breakout: !self.flags.require_breakout || breakout(ctx, direction),
            retracement: !self.flags.require_retracement
                || ctx.levels.in_zone(ctx.candle.close, direction),
            volume: !self.flags.require_volume || self.volume_surge(ctx),
            momentum: !self.flags.require_momentum || momentum(ctx, direction),
        }
    }

    fn volume_surge(&self, ctx: &SignalContext<'_>) -> bool {
        match ctx.volume_ma {
            Some(ma) => ctx.candle.volume > ma * self.volume_threshold,
            None => false,
        }
    }
}

fn breakout(ctx: &SignalContext<'_>, direction: Direction) -> bool {
    let close = ctx.candle.close;
    let prev_close = ctx.prev_candle.close;
    match direction {
        Direction::Long => prev_close <= ctx.prev_band.upper && close > ctx.band.upper,
        Direction::Short => prev_close >= ctx.prev_band.lower && close < ctx.band.lower,
    }
}

fn momentum(ctx: &SignalContext<'_>, direction: Direction) -> bool {
    let c = ctx.candle;
    match direction {
        Direction::Long => c.close > c.open && c.close > ctx.prev_candle.close,
        Direction::Short => c.close < c.open && c.close < ctx.prev_candle.close,
    }
}
