//! SwingPoint — a confirmed local price extremum.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a swing point is a local high or a local low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingKind {
    High,
    Low,
}

/// Why a candidate swing point was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SwingPointError {
    #[error("non-finite price")]
    NonFinitePrice,
    #[error("non-positive price {0}")]
    NonPositivePrice(f64),
    #[error("negative timestamp {0}")]
    NegativeTimestamp(i64),
}

/// A validated swing point. Only constructible through [`SwingPoint::new`]
/// (deserialization goes through it too), so a point held anywhere in the
/// engine is always well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSwingPoint")]
pub struct SwingPoint {
    index: usize,
    price: f64,
    kind: SwingKind,
    timestamp: i64,
}

#[derive(Deserialize)]
struct RawSwingPoint {
    index: usize,
    price: f64,
    kind: SwingKind,
    timestamp: i64,
}

impl TryFrom<RawSwingPoint> for SwingPoint {
    type Error = SwingPointError;

    fn try_from(raw: RawSwingPoint) -> Result<Self, Self::Error> {
        Self::new(raw.index, raw.price, raw.kind, raw.timestamp)
    }
}

impl SwingPoint {
    pub fn new(
        index: usize,
        price: f64,
        kind: SwingKind,
        timestamp: i64,
    ) -> Result<Self, SwingPointError> {
        if !price.is_finite() {
            return Err(SwingPointError::NonFinitePrice);
        }
        if price <= 0.0 {
            return Err(SwingPointError::NonPositivePrice(price));
        }
        if timestamp < 0 {
            return Err(SwingPointError::NegativeTimestamp(timestamp));
        }
        Ok(Self {
            index,
            price,
            kind,
            timestamp,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn kind(&self) -> SwingKind {
        self.kind
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_high(&self) -> bool {
        self.kind == SwingKind::High
    }
}
