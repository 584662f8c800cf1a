//! Domain types for the band/retracement strategy.

pub mod band;
pub mod candle;
pub mod signal;
pub mod swing;
pub mod trade;

pub use band::BandValue;
pub use candle::{Candle, CandleError, CandleSeries};
pub use signal::{Direction, GateFlags, Signal};
pub use swing::{SwingKind, SwingPoint, SwingPointError};
pub use trade::{ExitReason, Trade};
