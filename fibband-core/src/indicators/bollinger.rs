//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Upper: middle + std_dev * stddev(close, period)
//! - Lower: middle - std_dev * stddev(close, period)
//!
//! Uses population stddev (divide by N). First value at index
//! period - 1 + offset. A window containing a non-finite or non-positive
//! close yields `None`.

use super::BandIndicator;
use crate::config::BandParams;
use crate::domain::{BandValue, Candle};

#[derive(Debug, Clone, Copy, Default)]
pub struct Bollinger;

impl Bollinger {
    fn window(closes: &[f64], std_dev: f64) -> Option<BandValue> {
        if closes.iter().any(|c| !c.is_finite() || *c <= 0.0) {
            return None;
        }
        let n = closes.len() as f64;
        let mean = closes.iter().sum::<f64>() / n;
        let variance = closes
            .iter()
            .map(|c| {
                let diff = c - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;
        let half_width = std_dev * variance.sqrt();
        Some(BandValue {
            upper: mean + half_width,
            middle: mean,
            lower: mean - half_width,
        })
    }
}

impl BandIndicator for Bollinger {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn compute(&self, candles: &[Candle], params: &BandParams) -> Vec<Option<BandValue>> {
        let n = candles.len();
        let mut result = vec![None; n];
        let period = params.period;

        if period == 0 || n < period + params.offset {
            return result;
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        for i in (period - 1)..(n - params.offset) {
            let start = i + 1 - period;
            result[i + params.offset] = Self::window(&closes[start..=i], params.std_dev);
        }

        result
    }
}
