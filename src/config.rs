// =============================================================================
// Sentinel Configuration — policy constants with atomic save
// =============================================================================
//
// Every tunable threshold of the gate lives here so that a deployment can
// externalize policy without a rebuild.  Persistence uses an atomic tmp +
// rename pattern to prevent corruption on crash.  All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an
// older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_instrument() -> String {
    "BTC-USDT-SWAP".to_string()
}

fn default_bar() -> String {
    "15m".to_string()
}

fn default_candle_limit() -> usize {
    50
}

fn default_run_interval_secs() -> u64 {
    900
}

fn default_analytics_symbol() -> String {
    "BTC".to_string()
}

fn default_analytics_exchange() -> String {
    "OKX".to_string()
}

fn default_news_limit() -> usize {
    5
}

fn default_news_keywords() -> Vec<String> {
    // Asset-transfer terms, policy terms, named exchanges, tax/subsidy terms.
    vec![
        "transfer in".to_string(),
        "transfer out".to_string(),
        "whale transfer".to_string(),
        "policy".to_string(),
        "regulation".to_string(),
        "OKX".to_string(),
        "Binance".to_string(),
        "tax cut".to_string(),
        "subsidy".to_string(),
    ]
}

fn default_atr_window() -> usize {
    14
}

fn default_max_atr_price_frac() -> f64 {
    0.02
}

fn default_long_short_min() -> f64 {
    0.8
}

fn default_long_short_max() -> f64 {
    1.3
}

fn default_funding_min() -> f64 {
    -0.0003
}

fn default_funding_max() -> f64 {
    0.0005
}

fn default_min_holding_outflow() -> f64 {
    0.01
}

fn default_min_short_liquidation_share() -> f64 {
    0.55
}

fn default_fear_greed_min() -> i64 {
    20
}

fn default_fear_greed_max() -> i64 {
    80
}

fn default_mvrv_z_min() -> f64 {
    -2.0
}

fn default_mvrv_z_max() -> f64 {
    3.0
}

fn default_target_multiplier() -> f64 {
    1.022
}

fn default_stop_multiplier() -> f64 {
    0.979
}

// =============================================================================
// SignalParams
// =============================================================================

/// Thresholds for the six-condition long gate plus the advisory multipliers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalParams {
    /// Trailing window (in candles) for the ATR calculation.
    #[serde(default = "default_atr_window")]
    pub atr_window: usize,

    /// Maximum ATR as a fraction of the current price (volatility cap).
    #[serde(default = "default_max_atr_price_frac")]
    pub max_atr_price_frac: f64,

    /// Accepted long/short ratio band (inclusive).
    #[serde(default = "default_long_short_min")]
    pub long_short_min: f64,
    #[serde(default = "default_long_short_max")]
    pub long_short_max: f64,

    /// Accepted funding-rate band (inclusive, decimal rate).
    #[serde(default = "default_funding_min")]
    pub funding_min: f64,
    #[serde(default = "default_funding_max")]
    pub funding_max: f64,

    /// Minimum open-interest outflow ratio required.
    #[serde(default = "default_min_holding_outflow")]
    pub min_holding_outflow: f64,

    /// Short-liquidation share above which shorts are considered dominant
    /// (strict bound).
    #[serde(default = "default_min_short_liquidation_share")]
    pub min_short_liquidation_share: f64,

    /// Accepted Fear & Greed band (inclusive).
    #[serde(default = "default_fear_greed_min")]
    pub fear_greed_min: i64,
    #[serde(default = "default_fear_greed_max")]
    pub fear_greed_max: i64,

    /// Accepted MVRV Z-score band (inclusive).
    #[serde(default = "default_mvrv_z_min")]
    pub mvrv_z_min: f64,
    #[serde(default = "default_mvrv_z_max")]
    pub mvrv_z_max: f64,

    /// Take-profit multiplier applied to the entry price (+2.2%).
    #[serde(default = "default_target_multiplier")]
    pub target_multiplier: f64,

    /// Stop-loss multiplier applied to the entry price (-2.1%).
    #[serde(default = "default_stop_multiplier")]
    pub stop_multiplier: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            atr_window: default_atr_window(),
            max_atr_price_frac: default_max_atr_price_frac(),
            long_short_min: default_long_short_min(),
            long_short_max: default_long_short_max(),
            funding_min: default_funding_min(),
            funding_max: default_funding_max(),
            min_holding_outflow: default_min_holding_outflow(),
            min_short_liquidation_share: default_min_short_liquidation_share(),
            fear_greed_min: default_fear_greed_min(),
            fear_greed_max: default_fear_greed_max(),
            mvrv_z_min: default_mvrv_z_min(),
            mvrv_z_max: default_mvrv_z_max(),
            target_multiplier: default_target_multiplier(),
            stop_multiplier: default_stop_multiplier(),
        }
    }
}

// =============================================================================
// SentinelConfig
// =============================================================================

/// Top-level configuration for the Helios sentinel.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Perpetual instrument the sentinel watches (OKX instId format).
    #[serde(default = "default_instrument")]
    pub instrument: String,

    /// Candle timeframe for the kline fetch.
    #[serde(default = "default_bar")]
    pub bar: String,

    /// Number of candles requested per run.
    #[serde(default = "default_candle_limit")]
    pub candle_limit: usize,

    /// Seconds between scheduled evaluation runs.
    #[serde(default = "default_run_interval_secs")]
    pub run_interval_secs: u64,

    /// Base asset symbol used by the analytics endpoints (e.g. "BTC").
    #[serde(default = "default_analytics_symbol")]
    pub analytics_symbol: String,

    /// Exchange filter for funding-rate and open-interest analytics.
    #[serde(default = "default_analytics_exchange")]
    pub analytics_exchange: String,

    /// Number of headlines scanned by the circuit breaker per run.
    #[serde(default = "default_news_limit")]
    pub news_limit: usize,

    /// Headline keywords that trip the news circuit breaker.
    #[serde(default = "default_news_keywords")]
    pub news_keywords: Vec<String>,

    /// Gate thresholds and advisory multipliers.
    #[serde(default)]
    pub signal_params: SignalParams,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            instrument: default_instrument(),
            bar: default_bar(),
            candle_limit: default_candle_limit(),
            run_interval_secs: default_run_interval_secs(),
            analytics_symbol: default_analytics_symbol(),
            analytics_exchange: default_analytics_exchange(),
            news_limit: default_news_limit(),
            news_keywords: default_news_keywords(),
            signal_params: SignalParams::default(),
        }
    }
}

impl SentinelConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read sentinel config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse sentinel config from {}", path.display()))?;

        info!(
            path = %path.display(),
            instrument = %config.instrument,
            bar = %config.bar,
            "sentinel config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    ///
    /// This prevents corruption if the process crashes mid-write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise sentinel config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "sentinel config saved (atomic)");
        Ok(())
    }
}
