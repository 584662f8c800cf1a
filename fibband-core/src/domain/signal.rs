//! Signal — a transient directional entry proposal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Which entry gates were satisfied. A gate whose requirement is disabled
/// counts as satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GateFlags {
    pub breakout: bool,
    pub retracement: bool,
    pub volume: bool,
    pub momentum: bool,
}

impl GateFlags {
    pub const BREAKOUT_WEIGHT: f64 = 30.0;
    pub const RETRACEMENT_WEIGHT: f64 = 25.0;
    pub const VOLUME_WEIGHT: f64 = 25.0;
    pub const MOMENTUM_WEIGHT: f64 = 20.0;

    pub fn all(&self) -> bool {
        self.breakout && self.retracement && self.volume && self.momentum
    }

    /// Weighted strength in [0, 100].
    pub fn strength(&self) -> f64 {
        let mut strength = 0.0;
        if self.breakout {
            strength += Self::BREAKOUT_WEIGHT;
        }
        if self.retracement {
            strength += Self::RETRACEMENT_WEIGHT;
        }
        if self.volume {
            strength += Self::VOLUME_WEIGHT;
        }
        if self.momentum {
            strength += Self::MOMENTUM_WEIGHT;
        }
        strength
    }
}

/// A directional signal produced for one candle and consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub strength: f64,
    pub gates: GateFlags,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
}
