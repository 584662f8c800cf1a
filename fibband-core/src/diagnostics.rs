//! Structured diagnostic events emitted by the simulation.
//!
//! The engine never logs directly. It reports what it skipped or did through a
//! [`DiagnosticSink`], and the host decides where those events go (a tracing
//! subscriber, a test collector, or nowhere).

use std::fmt;
use std::sync::Mutex;

use crate::domain::{CandleError, Direction, ExitReason, SwingPointError};

/// One diagnostic event from a backtest run.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    RejectedCandle {
        index: usize,
        reason: CandleError,
    },
    RejectedSwingPoint {
        index: usize,
        reason: SwingPointError,
    },
    /// Latest opposing swing prices are equal; previous levels retained.
    DegenerateRetracementRange {
        index: usize,
        price: f64,
    },
    MissingBand {
        index: usize,
    },
    PositionOpened {
        trade_id: u64,
        index: usize,
        direction: Direction,
        price: f64,
        strength: f64,
    },
    PositionClosed {
        trade_id: u64,
        index: usize,
        reason: ExitReason,
        price: f64,
        pnl: f64,
    },
}

impl Diagnostic {
    /// Whether the event reports skipped input rather than a trading action.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::RejectedCandle { .. }
                | Self::RejectedSwingPoint { .. }
                | Self::DegenerateRetracementRange { .. }
                | Self::MissingBand { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RejectedCandle { index, reason } => {
                write!(f, "candle {index} rejected: {reason}")
            }
            Self::RejectedSwingPoint { index, reason } => {
                write!(f, "swing point at {index} rejected: {reason}")
            }
            Self::DegenerateRetracementRange { index, price } => {
                write!(f, "zero retracement range at {price} (candle {index})")
            }
            Self::MissingBand { index } => write!(f, "no band value at candle {index}"),
            Self::PositionOpened {
                trade_id,
                index,
                direction,
                price,
                strength,
            } => write!(
                f,
                "trade {trade_id} opened {direction} at {price} (candle {index}, strength {strength})"
            ),
            Self::PositionClosed {
                trade_id,
                index,
                reason,
                price,
                pnl,
            } => write!(
                f,
                "trade {trade_id} closed by {reason} at {price} (candle {index}, pnl {pnl:.2})"
            ),
        }
    }
}

/// Receiver for diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _diagnostic: &Diagnostic) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.events.lock() {
            Ok(events) => events.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(diagnostic.clone());
    }
}
