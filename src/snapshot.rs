// =============================================================================
// Snapshot Builder — resolves all metrics for one run
// =============================================================================
//
// Fetches the candle feed and the five analytics metrics concurrently and
// normalises every outcome into the typed, nullable snapshot structs the
// evaluator consumes.  Concurrency here is purely a latency optimisation:
// each fetch carries its own timeout and degrades to "unavailable" on
// failure, so the evaluator sees exactly the same snapshot it would under
// sequential resolution.  A failure in one source never aborts the others.
// =============================================================================

use tracing::warn;

use crate::config::SentinelConfig;
use crate::indicators::atr::average_true_range;
use crate::providers::{CoinglassClient, OkxMarketClient};
use crate::types::{Candle, DerivativesMetrics, MarketSnapshot, SentimentMetrics};

/// Resolves provider data into per-run snapshots.
pub struct SnapshotBuilder {
    okx: OkxMarketClient,
    coinglass: CoinglassClient,
}

impl SnapshotBuilder {
    pub fn new(okx: OkxMarketClient, coinglass: CoinglassClient) -> Self {
        Self { okx, coinglass }
    }

    /// Fetch and normalise every metric for one evaluation run.
    pub async fn build(
        &self,
        config: &SentinelConfig,
    ) -> (MarketSnapshot, DerivativesMetrics, SentimentMetrics) {
        let symbol = config.analytics_symbol.as_str();
        let exchange = config.analytics_exchange.as_str();

        let (candles, long_short, funding, holding, liquidation, fear_greed, mvrv) = tokio::join!(
            self.okx
                .fetch_candles(&config.instrument, &config.bar, config.candle_limit),
            self.coinglass.fetch_long_short_ratio(symbol),
            self.coinglass.fetch_funding_rate(symbol, exchange),
            self.coinglass.fetch_holding_change(symbol, exchange),
            self.coinglass.fetch_short_liquidation_ratio(symbol),
            self.coinglass.fetch_fear_greed(),
            self.coinglass.fetch_mvrv_z_score(symbol),
        );

        let market = match candles {
            Ok(candles) => market_snapshot(&candles, config.signal_params.atr_window),
            Err(e) => {
                warn!(error = %e, metric = "candles", "metric unavailable this run");
                MarketSnapshot::default()
            }
        };

        let derivatives = DerivativesMetrics {
            long_short_ratio: degrade(long_short, "long_short_ratio"),
            funding_rate: degrade(funding, "funding_rate"),
            holding_change_ratio: degrade(holding, "holding_change_ratio"),
            short_liquidation_ratio: degrade(liquidation, "short_liquidation_ratio"),
        };

        let sentiment = SentimentMetrics {
            fear_greed_index: degrade(fear_greed, "fear_greed_index"),
            mvrv_z_score: degrade(mvrv, "mvrv_z_score"),
        };

        (market, derivatives, sentiment)
    }
}

/// Map a provider failure to "unavailable" for that metric only.
fn degrade<T>(result: anyhow::Result<Option<T>>, metric: &'static str) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, metric, "metric unavailable this run");
            None
        }
    }
}

/// Derive the market snapshot from an oldest-first candle list.
pub fn market_snapshot(candles: &[Candle], atr_window: usize) -> MarketSnapshot {
    let price = candles.last().map(|c| c.close);
    let prev_price = if candles.len() >= 2 {
        Some(candles[candles.len() - 2].close)
    } else {
        None
    };
    let atr = average_true_range(candles, atr_window);

    MarketSnapshot {
        price,
        prev_price,
        atr,
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn candle(close: f64) -> Candle {
        Candle {
            ts: 0,
            open: close,
            high: close + 100.0,
            low: close - 100.0,
            close,
        }
    }

    #[test]
    fn snapshot_from_candles() {
        let candles = vec![candle(50_000.0), candle(50_200.0), candle(50_500.0)];
        let snap = market_snapshot(&candles, 14);
        assert_eq!(snap.price, Some(50_500.0));
        assert_eq!(snap.prev_price, Some(50_200.0));
        assert!(snap.atr.is_some());
    }

    #[test]
    fn snapshot_from_single_candle_has_no_prev_or_atr() {
        let candles = vec![candle(50_000.0)];
        let snap = market_snapshot(&candles, 14);
        assert_eq!(snap.price, Some(50_000.0));
        assert!(snap.prev_price.is_none());
        assert!(snap.atr.is_none());
    }

    #[test]
    fn snapshot_from_empty_feed_is_all_unavailable() {
        let snap = market_snapshot(&[], 14);
        assert!(snap.price.is_none());
        assert!(snap.prev_price.is_none());
        assert!(snap.atr.is_none());
    }

    #[test]
    fn degrade_keeps_values_and_drops_errors() {
        assert_eq!(degrade(Ok(Some(1.5)), "m"), Some(1.5));
        assert_eq!(degrade::<f64>(Ok(None), "m"), None);
        assert_eq!(degrade::<f64>(Err(anyhow::anyhow!("boom")), "m"), None);
    }
}
