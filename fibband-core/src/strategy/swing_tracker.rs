//! Swing point tracker — confirms centered local extrema and ages them out.
//!
//! The candle at `index - lookback` is a swing high when its high is strictly
//! greater than every other high in `[index - 2*lookback, index]`; an equal
//! neighbor disqualifies it. Lows are symmetric. Points older than
//! `lookback * 10` candles are pruned, so the set stays bounded.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::domain::{CandleSeries, SwingKind, SwingPoint};

/// Owned, bounded set of swing points for one backtest run.
#[derive(Debug, Clone)]
pub struct SwingTracker {
    lookback: usize,
    points: Vec<SwingPoint>,
}

impl SwingTracker {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback,
            points: Vec::new(),
        }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Age (in candles) beyond which points are pruned.
    pub fn max_age(&self) -> usize {
        self.lookback.saturating_mul(10)
    }

    pub fn points(&self) -> &[SwingPoint] {
        &self.points
    }

    /// Most recent point of the given kind.
    pub fn latest(&self, kind: SwingKind) -> Option<&SwingPoint> {
        self.points.iter().rev().find(|p| p.kind() == kind)
    }

    /// Seed the highest high and lowest low of the first `2 * lookback + 1`
    /// candles so retracement levels exist before the first confirmed swing.
    pub fn initialize(&mut self, series: &CandleSeries, sink: &dyn DiagnosticSink) {
        self.points.clear();
        let window = (2 * self.lookback + 1).min(series.len());

        let mut high: Option<(usize, f64, i64)> = None;
        let mut low: Option<(usize, f64, i64)> = None;
        for (i, candle) in series.iter_valid().take_while(|(i, _)| *i < window) {
            if high.map_or(true, |(_, h, _)| candle.high > h) {
                high = Some((i, candle.high, candle.timestamp));
            }
            if low.map_or(true, |(_, l, _)| candle.low < l) {
                low = Some((i, candle.low, candle.timestamp));
            }
        }

        let mut seeds: Vec<(usize, f64, SwingKind, i64)> = Vec::with_capacity(2);
        if let Some((i, price, ts)) = high {
            seeds.push((i, price, SwingKind::High, ts));
        }
        if let Some((i, price, ts)) = low {
            seeds.push((i, price, SwingKind::Low, ts));
        }
        seeds.sort_by_key(|(i, ..)| *i);

        for (index, price, kind, ts) in seeds {
            self.push(index, price, kind, ts, sink);
        }
    }

    /// Process candle `index`: confirm the candidate at `index - lookback`
    /// when enough history exists, then prune aged points.
    ///
    /// Returns the number of newly confirmed points.
    pub fn update(
        &mut self,
        series: &CandleSeries,
        index: usize,
        sink: &dyn DiagnosticSink,
    ) -> usize {
        let mut confirmed = 0;

        if self.lookback > 0 && index >= 2 * self.lookback && index < series.len() {
            let center = index - self.lookback;
            if let Some(candidate) = series.get(center) {
                let start = index - 2 * self.lookback;
                let neighbors = move || {
                    (start..=index)
                        .filter(move |&j| j != center)
                        .filter_map(move |j| series.get(j))
                };

                let is_high = neighbors().all(|c| c.high < candidate.high);
                let is_low = neighbors().all(|c| c.low > candidate.low);

                if is_high
                    && self.push(center, candidate.high, SwingKind::High, candidate.timestamp, sink)
                {
                    confirmed += 1;
                }
                if is_low
                    && self.push(center, candidate.low, SwingKind::Low, candidate.timestamp, sink)
                {
                    confirmed += 1;
                }
            }
        }

        self.prune(index);
        confirmed
    }

    fn push(
        &mut self,
        index: usize,
        price: f64,
        kind: SwingKind,
        timestamp: i64,
        sink: &dyn DiagnosticSink,
    ) -> bool {
        match SwingPoint::new(index, price, kind, timestamp) {
            Ok(point) => {
                self.points.push(point);
                true
            }
            Err(reason) => {
                sink.emit(&Diagnostic::RejectedSwingPoint { index, reason });
                false
            }
        }
    }

    fn prune(&mut self, current_index: usize) {
        let max_age = self.max_age();
        self.points
            .retain(|p| current_index.saturating_sub(p.index()) <= max_age);
    }
}
