//! Retracement levels between the latest opposing swing extrema.
//!
//! `price = high - (high - low) * ratio`, where `high`/`low` are the larger and
//! smaller of the most recent swing-high price and swing-low price (the kinds
//! are not trusted to be ordered). A zero range keeps the previous levels.

use serde::Serialize;

use crate::domain::{Direction, SwingKind, SwingPoint};

/// Canonical retracement proportions.
pub const RETRACEMENT_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

const LABELS: [&str; 7] = ["0%", "23.6%", "38.2%", "50%", "61.8%", "78.6%", "100%"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetracementLevel {
    pub ratio: f64,
    pub price: f64,
    pub label: &'static str,
}

/// Outcome of a [`RetracementCalculator::recompute`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetracementUpdate {
    Updated,
    /// Fewer than one point of either kind; levels untouched.
    MissingAnchors,
    /// Both anchors share one price; levels untouched.
    DegenerateRange(f64),
}

#[derive(Debug, Clone)]
pub struct RetracementCalculator {
    zone_min: f64,
    zone_max: f64,
    levels: Option<[RetracementLevel; 7]>,
}

impl RetracementCalculator {
    pub fn new(zone_min: f64, zone_max: f64) -> Self {
        Self {
            zone_min,
            zone_max,
            levels: None,
        }
    }

    pub fn levels(&self) -> Option<&[RetracementLevel; 7]> {
        self.levels.as_ref()
    }

    /// Level whose ratio is nearest `ratio` (first wins on a tie).
    pub fn nearest_level(&self, ratio: f64) -> Option<&RetracementLevel> {
        let levels = self.levels.as_ref()?;
        let mut best = &levels[0];
        for level in levels.iter().skip(1) {
            if (level.ratio - ratio).abs() < (best.ratio - ratio).abs() {
                best = level;
            }
        }
        Some(best)
    }

    pub fn recompute(&mut self, points: &[SwingPoint]) -> RetracementUpdate {
        let last_high = points.iter().rev().find(|p| p.kind() == SwingKind::High);
        let last_low = points.iter().rev().find(|p| p.kind() == SwingKind::Low);
        let (Some(h), Some(l)) = (last_high, last_low) else {
            return RetracementUpdate::MissingAnchors;
        };
        self.recompute_from_prices(h.price(), l.price())
    }

    /// Recompute from an explicit anchor pair.
    pub fn recompute_from_prices(&mut self, a: f64, b: f64) -> RetracementUpdate {
        let high = a.max(b);
        let low = a.min(b);
        let range = high - low;
        if range <= 0.0 || !range.is_finite() {
            return RetracementUpdate::DegenerateRange(high);
        }

        let mut levels = [RetracementLevel {
            ratio: 0.0,
            price: high,
            label: LABELS[0],
        }; 7];
        for (slot, (&ratio, &label)) in levels
            .iter_mut()
            .zip(RETRACEMENT_RATIOS.iter().zip(LABELS.iter()))
        {
            *slot = RetracementLevel {
                ratio,
                price: high - range * ratio,
                label,
            };
        }
        self.levels = Some(levels);
        RetracementUpdate::Updated
    }

    /// Whether `price` lies in the golden zone.
    ///
    /// The zone is the closed interval between the levels nearest the
    /// configured min and max ratios. The direction does not change the
    /// interval; long and short share one test. An unordered zone never matches.
    pub fn in_zone(&self, price: f64, _direction: Direction) -> bool {
        if !(self.zone_min < self.zone_max) || !price.is_finite() {
            return false;
        }
        let (Some(a), Some(b)) = (
            self.nearest_level(self.zone_min),
            self.nearest_level(self.zone_max),
        ) else {
            return false;
        };
        let lo = a.price.min(b.price);
        let hi = a.price.max(b.price);
        price >= lo && price <= hi
    }
}
