//! Candle loading for the runner.
//!
//! Two sources:
//! 1. CSV with a `timestamp,open,high,low,close,volume` header
//! 2. Synthetic random walk, deterministic per label
//!
//! Rows that parse but fail candle validation are kept (the engine skips
//! them) and counted in [`LoadedCandles::rejected`]. Rows that do not parse
//! are a [`LoadError`].

use chrono::DateTime;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use fibband_core::domain::Candle;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}, line {line}: {source}")]
    Row {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("{path}, line {line}: unrecognised timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{path}, line {line}: timestamp {timestamp} precedes the previous row")]
    OutOfOrder {
        path: PathBuf,
        line: u64,
        timestamp: i64,
    },

    #[error("{path} contains no candles")]
    Empty { path: PathBuf },
}

/// Where a candle series came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Csv(PathBuf),
    Synthetic { label: String },
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv(path) => write!(f, "csv:{}", path.display()),
            Self::Synthetic { label } => write!(f, "synthetic:{label}"),
        }
    }
}

/// A loaded candle series with provenance.
#[derive(Debug, Clone)]
pub struct LoadedCandles {
    pub candles: Vec<Candle>,
    /// Rows that parsed but failed validation.
    pub rejected: usize,
    /// BLAKE3 over all candle fields, for tagging results.
    pub dataset_hash: String,
    pub source: DataSource,
}

impl LoadedCandles {
    fn new(candles: Vec<Candle>, source: DataSource) -> Self {
        let rejected = candles.iter().filter(|c| !c.is_valid()).count();
        let dataset_hash = dataset_hash(&candles);
        Self {
            candles,
            rejected,
            dataset_hash,
            source,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.source, DataSource::Synthetic { .. })
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load candles from a CSV file.
///
/// `timestamp` is either integer milliseconds since the epoch or RFC 3339.
pub fn load_csv(path: &Path) -> Result<LoadedCandles, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut candles = Vec::new();
    let mut previous: Option<i64> = None;

    for record in reader.deserialize::<CsvRow>() {
        let row = record.map_err(|source| LoadError::Row {
            path: path.to_path_buf(),
            line: source.position().map_or(0, |p| p.line()),
            source,
        })?;
        let line = candles.len() as u64 + 2;

        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::Timestamp {
            path: path.to_path_buf(),
            line,
            value: row.timestamp.clone(),
        })?;
        if previous.is_some_and(|p| timestamp < p) {
            return Err(LoadError::OutOfOrder {
                path: path.to_path_buf(),
                line,
                timestamp,
            });
        }
        previous = Some(timestamp);

        candles.push(Candle {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    if candles.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(LoadedCandles::new(candles, DataSource::Csv(path.to_path_buf())))
}

fn parse_timestamp(value: &str) -> Option<i64> {
    if let Ok(ms) = value.parse::<i64>() {
        return Some(ms);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Deterministic synthetic series of `n` candles spaced `interval_ms` apart.
///
/// Seeded from the BLAKE3 hash of `label`, so the same label always yields
/// the same candles.
pub fn generate_synthetic_candles(label: &str, n: usize, interval_ms: i64) -> Vec<Candle> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(label.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    // 2024-01-01T00:00:00Z
    let start_ms: i64 = 1_704_067_200_000;
    let mut price = 100.0_f64;
    let mut candles = Vec::with_capacity(n);

    for i in 0..n {
        let step: f64 = rng.gen_range(-0.004..0.004);
        let open = price;
        let close = (price * (1.0 + step)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.002));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.002));
        // occasional volume bursts so the volume gate can fire
        let burst = if rng.gen_bool(0.08) { 3.0 } else { 1.0 };
        let volume = rng.gen_range(500.0..1_500.0) * burst;

        candles.push(Candle {
            timestamp: start_ms + i as i64 * interval_ms,
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
    }

    candles
}

/// Synthetic one-minute candles wrapped with provenance.
pub fn load_synthetic(label: &str, n: usize) -> LoadedCandles {
    LoadedCandles::new(
        generate_synthetic_candles(label, n, 60_000),
        DataSource::Synthetic {
            label: label.to_string(),
        },
    )
}

/// BLAKE3 hash over every candle field, hex encoded.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for c in candles {
        hasher.update(&c.timestamp.to_le_bytes());
        for v in [c.open, c.high, c.low, c.close, c.volume] {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
