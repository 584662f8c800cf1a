//! BandValue — one point of an upper/middle/lower price envelope.

use serde::{Deserialize, Serialize};

/// Upper, middle and lower band levels for one candle.
///
/// Band series are index-aligned with the candle series; warm-up positions
/// hold `None` instead of a `BandValue`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BandValue {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// True when `price` sits on or between the outer bands.
    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower && price <= self.upper
    }
}
