//! Candle — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::{Diagnostic, DiagnosticSink};

/// OHLCV candle for a single time bucket.
///
/// `timestamp` is milliseconds since the Unix epoch and must be
/// non-decreasing across a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Why a candle was rejected at ingestion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("negative timestamp {0}")]
    NegativeTimestamp(i64),
    #[error("non-finite {field}")]
    NonFinite { field: &'static str },
    #[error("non-positive {field}: {value}")]
    NonPositivePrice { field: &'static str, value: f64 },
    #[error("negative volume: {0}")]
    NegativeVolume(f64),
    #[error("high {high} below low {low}")]
    Inverted { high: f64, low: f64 },
    #[error("timestamp {timestamp} precedes previous candle at {previous}")]
    OutOfOrder { timestamp: i64, previous: i64 },
}

impl Candle {
    /// Check every field once. Callers keep the verdict instead of re-checking.
    pub fn validate(&self) -> Result<(), CandleError> {
        if self.timestamp < 0 {
            return Err(CandleError::NegativeTimestamp(self.timestamp));
        }
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (field, value) in prices {
            if !value.is_finite() {
                return Err(CandleError::NonFinite { field });
            }
            if value <= 0.0 {
                return Err(CandleError::NonPositivePrice { field, value });
            }
        }
        if !self.volume.is_finite() {
            return Err(CandleError::NonFinite { field: "volume" });
        }
        if self.volume < 0.0 {
            return Err(CandleError::NegativeVolume(self.volume));
        }
        if self.high < self.low {
            return Err(CandleError::Inverted {
                high: self.high,
                low: self.low,
            });
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Candle open time as a UTC datetime, if the timestamp is representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// A candle sequence that has passed through the validation boundary.
///
/// Every candle is validated exactly once in [`CandleSeries::ingest`], which
/// also rejects a candle timestamped before the last accepted one. Rejected
/// candles stay in place so indices remain aligned with band series, but
/// [`CandleSeries::get`] hides them.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
    valid: Vec<bool>,
    rejected: usize,
}

impl CandleSeries {
    pub fn ingest(candles: &[Candle], sink: &dyn DiagnosticSink) -> Self {
        let mut valid = Vec::with_capacity(candles.len());
        let mut rejected = 0;
        let mut previous: Option<i64> = None;
        for (index, candle) in candles.iter().enumerate() {
            let verdict = candle.validate().and_then(|()| match previous {
                Some(previous) if candle.timestamp < previous => Err(CandleError::OutOfOrder {
                    timestamp: candle.timestamp,
                    previous,
                }),
                _ => Ok(()),
            });
            match verdict {
                Ok(()) => {
                    previous = Some(candle.timestamp);
                    valid.push(true);
                }
                Err(reason) => {
                    sink.emit(&Diagnostic::RejectedCandle { index, reason });
                    valid.push(false);
                    rejected += 1;
                }
            }
        }
        Self {
            candles: candles.to_vec(),
            valid,
            rejected,
        }
    }

    /// The candle at `index`, or `None` if it is out of range or was rejected.
    pub fn get(&self, index: usize) -> Option<&Candle> {
        match self.valid.get(index) {
            Some(true) => self.candles.get(index),
            _ => None,
        }
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.valid.get(index).copied().unwrap_or(false)
    }

    /// All candles including rejected ones, index-aligned with band series.
    pub fn raw(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Iterate `(index, candle)` over accepted candles only.
    pub fn iter_valid(&self) -> impl Iterator<Item = (usize, &Candle)> + '_ {
        self.candles
            .iter()
            .enumerate()
            .filter(move |(i, _)| self.valid[*i])
    }

    /// Last accepted candle at or before `index`.
    pub fn last_valid_at_or_before(&self, index: usize) -> Option<(usize, &Candle)> {
        let end = index.min(self.candles.len().checked_sub(1)?);
        (0..=end)
            .rev()
            .find(|&i| self.valid[i])
            .map(|i| (i, &self.candles[i]))
    }
}
