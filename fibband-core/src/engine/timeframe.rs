//! Timeframe detection from candle timestamps.

use serde::{Deserialize, Serialize};

use crate::domain::CandleSeries;

/// Average inter-candle spacing below this is treated as seconds data.
pub const SECONDS_THRESHOLD_MS: i64 = 60_000;

/// Granularity of a candle series. Decides the unit of `max_holding` and the
/// annualization factor of the Sharpe-like ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Seconds,
    Minutes,
}

impl Timeframe {
    /// Detect from the average spacing of valid candles. Fewer than two
    /// valid candles, or a non-positive average, falls back to minutes.
    pub fn detect(series: &CandleSeries) -> Self {
        let mut valid = series.iter_valid();
        let Some((_, first)) = valid.next() else {
            return Self::Minutes;
        };
        let (count, last_ts) = valid.fold((1_i64, first.timestamp), |(n, _), (_, c)| {
            (n + 1, c.timestamp)
        });
        if count < 2 {
            return Self::Minutes;
        }
        let average = (last_ts - first.timestamp) as f64 / (count - 1) as f64;
        if average > 0.0 && average < SECONDS_THRESHOLD_MS as f64 {
            Self::Seconds
        } else {
            Self::Minutes
        }
    }

    pub fn unit_ms(self) -> i64 {
        match self {
            Self::Seconds => 1_000,
            Self::Minutes => 60_000,
        }
    }

    /// Periods per year: 252 trading days of round-the-clock seconds or minutes.
    pub fn annualization_factor(self) -> f64 {
        match self {
            Self::Seconds => 252.0 * 24.0 * 60.0 * 60.0,
            Self::Minutes => 252.0 * 24.0 * 60.0,
        }
    }

    /// Whole units elapsed between two timestamps (0 if `now` precedes `entry`).
    pub fn held_units(self, entry_ms: i64, now_ms: i64) -> u64 {
        let elapsed = now_ms.saturating_sub(entry_ms).max(0);
        (elapsed / self.unit_ms()) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullSink;
    use crate::domain::Candle;

    fn series(step_ms: i64, n: usize) -> CandleSeries {
        let candles: Vec<Candle> = (0..n)
            .map(|i| Candle {
                timestamp: i as i64 * step_ms,
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 10.0,
            })
            .collect();
        CandleSeries::ingest(&candles, &NullSink)
    }

    #[test]
    fn detects_seconds_and_minutes() {
        assert_eq!(Timeframe::detect(&series(1_000, 10)), Timeframe::Seconds);
        assert_eq!(Timeframe::detect(&series(59_999, 10)), Timeframe::Seconds);
        assert_eq!(Timeframe::detect(&series(60_000, 10)), Timeframe::Minutes);
        assert_eq!(Timeframe::detect(&series(3_600_000, 10)), Timeframe::Minutes);
    }

    #[test]
    fn short_series_defaults_to_minutes() {
        assert_eq!(Timeframe::detect(&series(1_000, 1)), Timeframe::Minutes);
        assert_eq!(Timeframe::detect(&CandleSeries::default()), Timeframe::Minutes);
    }

    #[test]
    fn held_units_truncate() {
        assert_eq!(Timeframe::Minutes.held_units(0, 119_999), 1);
        assert_eq!(Timeframe::Seconds.held_units(0, 119_999), 119);
        assert_eq!(Timeframe::Minutes.held_units(60_000, 0), 0);
    }

    #[test]
    fn annualization_factors() {
        assert_eq!(Timeframe::Minutes.annualization_factor(), 362_880.0);
        assert_eq!(Timeframe::Seconds.annualization_factor(), 21_772_800.0);
    }
}
