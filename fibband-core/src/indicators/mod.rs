//! Indicator implementations.
//!
//! Indicators are pure functions: candle history in, an index-aligned series
//! out. They are computed once per configuration before the candle loop and
//! never see future candles. Warm-up positions are `None`.

pub mod bollinger;
pub mod sma;

pub use bollinger::Bollinger;
pub use sma::sma;

use crate::config::BandParams;
use crate::domain::{BandValue, Candle};

/// An upper/middle/lower envelope indicator.
///
/// `compute` must return exactly `candles.len()` entries and must be
/// deterministic with no state carried between calls.
pub trait BandIndicator: Send + Sync {
    fn name(&self) -> &str;

    fn compute(&self, candles: &[Candle], params: &BandParams) -> Vec<Option<BandValue>>;
}

/// Create synthetic one-minute candles from close prices for testing.
///
/// open = previous close (or close for the first candle),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: i as i64 * 60_000,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
