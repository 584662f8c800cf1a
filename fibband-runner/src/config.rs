//! Sweep files and optimizer settings.
//!
//! A sweep file is a TOML document with four optional sections:
//!
//! ```toml
//! [base]        # StrategyConfig; fields the grid does not vary come from here
//! initial_capital = 25000.0
//!
//! [grid]        # ParamGrid; missing dimensions use the curated ranges
//! periods = [14, 20]
//!
//! [filters]     # OptimizationFilters
//! min_trades = 5
//!
//! [optimizer]   # OptimizerConfig
//! parallel = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use fibband_core::config::{ConfigError, StrategyConfig};

use crate::filters::OptimizationFilters;
use crate::grid::ParamGrid;

/// Optimizer run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Combinations between cooperative yields of the calling thread.
    pub yield_every: usize,
    /// Profit target / stop loss must exceed this for a combination to run.
    pub min_reward_risk: f64,
    /// Simulate each batch of `yield_every` combinations on the rayon pool.
    pub parallel: bool,
    /// Worker threads for parallel mode; `None` uses the global pool.
    pub threads: Option<usize>,
    /// Keep only the best N results.
    pub max_results: Option<usize>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            yield_every: 100,
            min_reward_risk: 1.2,
            parallel: false,
            threads: None,
            max_results: None,
        }
    }
}

/// Everything needed to run one optimization, as loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepFile {
    pub base: StrategyConfig,
    pub grid: ParamGrid,
    pub filters: OptimizationFilters,
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Error)]
pub enum SweepFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid base strategy: {0}")]
    InvalidBase(#[from] ConfigError),
}

impl SweepFile {
    pub fn from_toml_str(s: &str) -> Result<Self, SweepFileError> {
        let file: Self = toml::from_str(s)?;
        file.base.validate()?;
        Ok(file)
    }

    pub fn load(path: &Path) -> Result<Self, SweepFileError> {
        Self::from_toml_str(&read(path)?)
    }
}

/// Load and validate a standalone strategy config (TOML).
pub fn load_strategy_config(path: &Path) -> Result<StrategyConfig, SweepFileError> {
    let config: StrategyConfig = toml::from_str(&read(path)?)?;
    config.validate()?;
    Ok(config)
}

fn read(path: &Path) -> Result<String, SweepFileError> {
    std::fs::read_to_string(path).map_err(|source| SweepFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Deterministic content hash of a parameter set (BLAKE3 over its JSON form).
pub fn config_fingerprint(config: &StrategyConfig) -> String {
    let json = serde_json::to_string(config).unwrap_or_default();
    blake3::hash(json.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_all_defaults() {
        let file = SweepFile::from_toml_str("").unwrap();
        assert_eq!(file, SweepFile::default());
        assert_eq!(file.optimizer.yield_every, 100);
        assert_eq!(file.optimizer.min_reward_risk, 1.2);
    }

    #[test]
    fn sections_parse() {
        let toml = r#"
            [base]
            initial_capital = 25000.0
            swing_lookback = 4

            [base.band]
            period = 14
            std_dev = 2.5
            offset = 1

            [grid]
            periods = [14, 20]
            std_devs = [2.0]

            [filters]
            min_trades = 5
            max_drawdown = 0.3

            [optimizer]
            parallel = true
            max_results = 10
        "#;
        let file = SweepFile::from_toml_str(toml).unwrap();
        assert_eq!(file.base.initial_capital, 25_000.0);
        assert_eq!(file.base.band.period, 14);
        assert_eq!(file.grid.periods, vec![14, 20]);
        assert_eq!(file.filters.min_trades, Some(5));
        assert!(file.filters.min_win_rate.is_none());
        assert!(file.optimizer.parallel);
        assert_eq!(file.optimizer.max_results, Some(10));
    }

    #[test]
    fn invalid_base_is_rejected() {
        let toml = "[base]\ngolden_zone_min = 0.7\ngolden_zone_max = 0.5\n";
        assert!(matches!(
            SweepFile::from_toml_str(toml),
            Err(SweepFileError::InvalidBase(ConfigError::GoldenZone { .. }))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            SweepFile::from_toml_str("[grid\nperiods = 3"),
            Err(SweepFileError::Parse(_))
        ));
    }

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "profit_target = 0.04\nmax_holding = 90").unwrap();
        let config = load_strategy_config(file.path()).unwrap();
        assert_eq!(config.profit_target, 0.04);
        assert_eq!(config.max_holding, 90);

        let missing = load_strategy_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(SweepFileError::Io { .. })));
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let a = StrategyConfig::default();
        let b = StrategyConfig {
            leverage: 2.0,
            ..StrategyConfig::default()
        };
        assert_eq!(config_fingerprint(&a), config_fingerprint(&a.clone()));
        assert_ne!(config_fingerprint(&a), config_fingerprint(&b));
        assert_eq!(config_fingerprint(&a).len(), 64);
    }
}
