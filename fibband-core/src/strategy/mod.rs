//! Strategy components driven candle-by-candle by the backtest engine.
//!
//! - [`SwingTracker`]: bounded set of confirmed local extrema
//! - [`RetracementCalculator`]: proportional levels between the latest opposing extrema
//! - [`SignalEvaluator`]: breakout / retracement / volume / momentum gates
//! - [`PositionManager`]: Flat -> Open -> Flat state machine and capital

pub mod position_manager;
pub mod retracement;
pub mod signal_evaluator;
pub mod swing_tracker;

pub use position_manager::{PositionManager, PositionState, MIN_ACTIONABLE_STRENGTH};
pub use retracement::{
    RetracementCalculator, RetracementLevel, RetracementUpdate, RETRACEMENT_RATIOS,
};
pub use signal_evaluator::{SignalContext, SignalEvaluator};
pub use swing_tracker::SwingTracker;
