//! Diagnostic sink that forwards simulation events to `tracing`.

use fibband_core::diagnostics::{Diagnostic, DiagnosticSink};

/// Skipped-input events go to `debug`, trading actions to `trace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::RejectedCandle { index, reason } => {
                tracing::debug!(index, %reason, "candle rejected");
            }
            Diagnostic::RejectedSwingPoint { index, reason } => {
                tracing::debug!(index, %reason, "swing point rejected");
            }
            Diagnostic::DegenerateRetracementRange { index, price } => {
                tracing::trace!(index, price, "zero retracement range, keeping previous levels");
            }
            Diagnostic::MissingBand { index } => {
                tracing::trace!(index, "no band value");
            }
            Diagnostic::PositionOpened {
                trade_id,
                index,
                direction,
                price,
                strength,
            } => {
                tracing::trace!(trade_id, index, %direction, price, strength, "position opened");
            }
            Diagnostic::PositionClosed {
                trade_id,
                index,
                reason,
                price,
                pnl,
            } => {
                tracing::trace!(trade_id, index, %reason, price, pnl, "position closed");
            }
        }
    }
}
