//! Strategy configuration for a single backtest run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Band indicator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandParams {
    pub period: usize,
    pub std_dev: f64,
    /// Forward shift in candles; the value at `i` comes from the window ending at `i - offset`.
    pub offset: usize,
}

impl Default for BandParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev: 2.0,
            offset: 0,
        }
    }
}

/// Entry gate requirements and enabled directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalFlags {
    pub require_breakout: bool,
    pub require_retracement: bool,
    pub require_volume: bool,
    pub require_momentum: bool,
    pub enable_long: bool,
    pub enable_short: bool,
}

impl Default for SignalFlags {
    fn default() -> Self {
        Self {
            require_breakout: true,
            require_retracement: true,
            require_volume: true,
            require_momentum: true,
            enable_long: true,
            enable_short: true,
        }
    }
}

impl SignalFlags {
    /// Every gate bypassed, both directions enabled.
    pub fn permissive() -> Self {
        Self {
            require_breakout: false,
            require_retracement: false,
            require_volume: false,
            require_momentum: false,
            enable_long: true,
            enable_short: true,
        }
    }

    /// Compact tag such as `B-R-V-M/LS` (lowercase letter = gate bypassed).
    pub fn label(&self) -> String {
        let gate = |on: bool, c: char| {
            if on {
                c
            } else {
                c.to_ascii_lowercase()
            }
        };
        let mut dirs = String::new();
        if self.enable_long {
            dirs.push('L');
        }
        if self.enable_short {
            dirs.push('S');
        }
        if dirs.is_empty() {
            dirs.push('-');
        }
        format!(
            "{}-{}-{}-{}/{}",
            gate(self.require_breakout, 'B'),
            gate(self.require_retracement, 'R'),
            gate(self.require_volume, 'V'),
            gate(self.require_momentum, 'M'),
            dirs
        )
    }
}

/// Complete parameter set for one backtest.
///
/// `profit_target` and `stop_loss` are fractions of the entry price (0.03 = 3%).
/// `max_holding` is in seconds for sub-minute data and minutes otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub band: BandParams,
    pub swing_lookback: usize,
    pub golden_zone_min: f64,
    pub golden_zone_max: f64,
    pub profit_target: f64,
    pub stop_loss: f64,
    pub max_holding: u64,
    pub leverage: f64,
    pub volume_threshold: f64,
    pub initial_capital: f64,
    pub flags: SignalFlags,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            band: BandParams::default(),
            swing_lookback: 5,
            golden_zone_min: 0.5,
            golden_zone_max: 0.618,
            profit_target: 0.03,
            stop_loss: 0.02,
            max_holding: 60,
            leverage: 1.0,
            volume_threshold: 1.5,
            initial_capital: 10_000.0,
            flags: SignalFlags::default(),
        }
    }
}

/// Configuration problems detected before simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("band period must be >= 1")]
    ZeroPeriod,
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("golden zone bounds must satisfy 0 <= min < max <= 1, got {min}..{max}")]
    GoldenZone { min: f64, max: f64 },
    #[error("profit target / stop loss = {ratio:.3} does not exceed {minimum}")]
    RewardRisk { ratio: f64, minimum: f64 },
    #[error("max holding must be >= 1")]
    ZeroHolding,
}

impl StrategyConfig {
    /// Structural validity: positive ranges and an ordered golden zone.
    ///
    /// The reward/risk floor is a search policy and is checked separately by
    /// [`StrategyConfig::check_reward_risk`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.band.period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        let positive = [
            ("band.std_dev", self.band.std_dev),
            ("profit_target", self.profit_target),
            ("stop_loss", self.stop_loss),
            ("leverage", self.leverage),
            ("volume_threshold", self.volume_threshold),
            ("initial_capital", self.initial_capital),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if !self.golden_zone_is_ordered() {
            return Err(ConfigError::GoldenZone {
                min: self.golden_zone_min,
                max: self.golden_zone_max,
            });
        }
        if self.max_holding == 0 {
            return Err(ConfigError::ZeroHolding);
        }
        Ok(())
    }

    pub fn golden_zone_is_ordered(&self) -> bool {
        self.golden_zone_min.is_finite()
            && self.golden_zone_max.is_finite()
            && self.golden_zone_min >= 0.0
            && self.golden_zone_max <= 1.0
            && self.golden_zone_min < self.golden_zone_max
    }

    pub fn reward_risk(&self) -> f64 {
        if self.stop_loss > 0.0 {
            self.profit_target / self.stop_loss
        } else {
            f64::INFINITY
        }
    }

    pub fn check_reward_risk(&self, minimum: f64) -> Result<(), ConfigError> {
        let ratio = self.reward_risk();
        if ratio > minimum {
            Ok(())
        } else {
            Err(ConfigError::RewardRisk { ratio, minimum })
        }
    }

    /// Short human-readable description used in progress reports and logs.
    pub fn describe(&self) -> String {
        format!(
            "BB({},{},{}) swing={} zone={}-{} tp={:.2}% sl={:.2}% hold={} lev={}x vol={}x {}",
            self.band.period,
            self.band.std_dev,
            self.band.offset,
            self.swing_lookback,
            self.golden_zone_min,
            self.golden_zone_max,
            self.profit_target * 100.0,
            self.stop_loss * 100.0,
            self.max_holding,
            self.leverage,
            self.volume_threshold,
            self.flags.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = StrategyConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.check_reward_risk(1.2).is_ok());
    }

    #[test]
    fn rejects_inverted_golden_zone() {
        let config = StrategyConfig {
            golden_zone_min: 0.618,
            golden_zone_max: 0.5,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GoldenZone { .. })
        ));
    }

    #[test]
    fn rejects_equal_golden_zone() {
        let config = StrategyConfig {
            golden_zone_min: 0.5,
            golden_zone_max: 0.5,
            ..StrategyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn reward_risk_floor_is_strict() {
        let config = StrategyConfig {
            profit_target: 0.024,
            stop_loss: 0.02,
            ..StrategyConfig::default()
        };
        // 0.024 / 0.02 is 1.2 within float error; keep it off the boundary.
        assert!(config.check_reward_risk(1.25).is_err());
        assert!(config.check_reward_risk(1.1).is_ok());
    }

    #[test]
    fn rejects_zero_period_and_negative_leverage() {
        let mut config = StrategyConfig::default();
        config.band.period = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPeriod));

        let config = StrategyConfig {
            leverage: -2.0,
            ..StrategyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "leverage",
                ..
            })
        ));
    }

    #[test]
    fn flags_label() {
        assert_eq!(SignalFlags::default().label(), "B-R-V-M/LS");
        let flags = SignalFlags {
            require_volume: false,
            enable_short: false,
            ..SignalFlags::default()
        };
        assert_eq!(flags.label(), "B-R-v-M/L");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: StrategyConfig = serde_json::from_str(r#"{"swing_lookback": 8}"#).unwrap();
        assert_eq!(parsed.swing_lookback, 8);
        assert_eq!(parsed.band, BandParams::default());
    }
}
