// =============================================================================
// Shared types used across the Helios sentinel
// =============================================================================
//
// Every metric that arrives from an external provider is optional: a `None`
// means "unavailable this run" and is a valid domain value, not an error.
// All snapshots are built fresh for a single run and never mutated afterwards.
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single OHLC candle from the OKX market feed (oldest-first in slices).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time in milliseconds since the epoch.
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Price and volatility snapshot from the candle feed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Latest closed-candle price.
    pub price: Option<f64>,

    /// Close of the candle before the latest one.
    pub prev_price: Option<f64>,

    /// Trailing average true range (absent when candle history is too short).
    pub atr: Option<f64>,
}

/// Derivatives positioning metrics from the futures-analytics feed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DerivativesMetrics {
    /// Top-trader long/short ratio.
    pub long_short_ratio: Option<f64>,

    /// Periodic funding rate as a decimal (e.g. 0.0001 = 0.01%).
    pub funding_rate: Option<f64>,

    /// Open-interest outflow since the previous sample:
    /// `(prev_holdings - curr_holdings) / prev_holdings`.
    /// Positive values mean contracts are being closed.
    pub holding_change_ratio: Option<f64>,

    /// Share of total liquidation volume attributable to shorts, in [0, 1].
    pub short_liquidation_ratio: Option<f64>,
}

/// Market sentiment metrics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SentimentMetrics {
    /// Fear & Greed index in [0, 100].
    pub fear_greed_index: Option<i64>,

    /// MVRV Z-score valuation metric.
    pub mvrv_z_score: Option<f64>,
}

/// A single headline from the news feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsEvent {
    pub title: String,
}

/// How a single sentinel run concluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The news circuit breaker tripped; evaluation was skipped.
    BreakerTripped { headline: String },

    /// The full gate was evaluated.
    Evaluated { long_signal: bool },
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BreakerTripped { .. } => write!(f, "BreakerTripped"),
            Self::Evaluated { long_signal: true } => write!(f, "Evaluated(LONG)"),
            Self::Evaluated { long_signal: false } => write!(f, "Evaluated(no-signal)"),
        }
    }
}
