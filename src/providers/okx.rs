// =============================================================================
// OKX Market Data Client — public v5 candle endpoint
// =============================================================================
//
// Fetches recent OHLC candles for a perpetual instrument.  The OKX API
// returns candles newest-first as arrays of strings; `parse_candles` converts
// that payload into a typed, oldest-first list so indicator code can assume
// chronological order.
// =============================================================================

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::types::Candle;

/// Client for the public OKX v5 market-data API.
pub struct OkxMarketClient {
    client: reqwest::Client,
    base_url: String,
}

impl OkxMarketClient {
    /// Create a new client with a default HTTP client (6 s timeout).
    pub fn new() -> Self {
        Self::with_client(
            reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(6))
                .build()
                .expect("failed to build reqwest client for OkxMarketClient"),
        )
    }

    /// Create a client that re-uses an existing HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: "https://www.okx.com".to_string(),
        }
    }

    /// Fetch the most recent `limit` candles for `instrument` at timeframe
    /// `bar`, oldest-first.
    pub async fn fetch_candles(
        &self,
        instrument: &str,
        bar: &str,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/api/v5/market/candles?instId={}&bar={}&limit={}",
            self.base_url, instrument, bar, limit
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET candles for {instrument}"))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse candle response body")?;

        if !status.is_success() {
            anyhow::bail!("candle API returned {}: {}", status, body);
        }

        let candles = parse_candles(&body)?;

        debug!(
            instrument,
            bar,
            count = candles.len(),
            "candles fetched"
        );

        Ok(candles)
    }
}

impl Default for OkxMarketClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an OKX candle payload into a typed, oldest-first candle list.
///
/// Rows with missing, non-numeric, or non-positive price fields are skipped
/// rather than failing the whole batch.
pub fn parse_candles(body: &Value) -> Result<Vec<Candle>> {
    let rows = body["data"]
        .as_array()
        .context("candle response has no data array")?;

    let mut candles: Vec<Candle> = rows
        .iter()
        .filter_map(|row| {
            let fields = row.as_array()?;
            if fields.len() < 5 {
                return None;
            }
            let num = |i: usize| -> Option<f64> {
                fields[i]
                    .as_str()?
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite() && *v > 0.0)
            };
            Some(Candle {
                ts: fields[0].as_str()?.parse().ok()?,
                open: num(1)?,
                high: num(2)?,
                low: num(3)?,
                close: num(4)?,
            })
        })
        .collect();

    // OKX returns newest-first; indicators expect chronological order.
    candles.reverse();
    Ok(candles)
}
