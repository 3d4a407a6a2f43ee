// =============================================================================
// Coinglass Analytics Client — derivatives positioning and sentiment feeds
// =============================================================================
//
// Five independent endpoints feed the gate:
//
//   longShortChart     — top-trader long/short ratio
//   fundingRate        — periodic funding rate
//   positionsChange    — open-interest holdings (outflow ratio)
//   liquidation/chart  — long vs short liquidation volumes
//   fearGreedIndex     — bounded sentiment score
//   mvrvZScore         — valuation metric
//
// Each fetch returns `Result<Option<T>>`: transport and HTTP failures are
// `Err` (the snapshot builder degrades them to unavailable), while a payload
// that legitimately lacks the value — e.g. zero previous holdings — is
// `Ok(None)`.  All normalisation decisions live in the pure `parse_*`
// functions below.
// =============================================================================

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

/// Client for the public Coinglass futures-analytics endpoints.
pub struct CoinglassClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoinglassClient {
    /// Create a new client with a default HTTP client (4 s timeout).
    pub fn new() -> Self {
        Self::with_client(
            reqwest::Client::builder()
                .user_agent("Mozilla/5.0")
                .timeout(std::time::Duration::from_secs(4))
                .build()
                .expect("failed to build reqwest client for CoinglassClient"),
        )
    }

    /// Create a client that re-uses an existing HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: "https://futures.coinglass.com".to_string(),
        }
    }

    async fn get_json(&self, path: &str, what: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {what}"))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse {what} response body"))?;

        if !status.is_success() {
            anyhow::bail!("{what} API returned {}: {}", status, body);
        }

        Ok(body)
    }

    /// Latest top-trader long/short ratio for `symbol`.
    pub async fn fetch_long_short_ratio(&self, symbol: &str) -> Result<Option<f64>> {
        let body = self
            .get_json(
                &format!("/Position/longShortChart?symbol={symbol}"),
                "long/short ratio",
            )
            .await?;
        let ratio = parse_long_short_ratio(&body);
        debug!(symbol, ?ratio, "long/short ratio fetched");
        Ok(ratio)
    }

    /// Latest funding rate for `symbol` on `exchange`.
    pub async fn fetch_funding_rate(&self, symbol: &str, exchange: &str) -> Result<Option<f64>> {
        let body = self
            .get_json(
                &format!("/openInterest/fundingRate?symbol={symbol}&exchange={exchange}"),
                "funding rate",
            )
            .await?;
        let rate = parse_funding_rate(&body);
        debug!(symbol, exchange, ?rate, "funding rate fetched");
        Ok(rate)
    }

    /// Open-interest outflow ratio between the two most recent samples.
    pub async fn fetch_holding_change(&self, symbol: &str, exchange: &str) -> Result<Option<f64>> {
        let body = self
            .get_json(
                &format!("/openInterest/positionsChange?symbol={symbol}&exchange={exchange}"),
                "holding change",
            )
            .await?;
        let change = parse_holding_change(&body);
        debug!(symbol, exchange, ?change, "holding change fetched");
        Ok(change)
    }

    /// Share of liquidation volume attributable to shorts.
    pub async fn fetch_short_liquidation_ratio(&self, symbol: &str) -> Result<Option<f64>> {
        let body = self
            .get_json(
                &format!("/liquidation/chart?symbol={symbol}"),
                "liquidation ratio",
            )
            .await?;
        let ratio = parse_short_liquidation_ratio(&body);
        debug!(symbol, ?ratio, "liquidation ratio fetched");
        Ok(ratio)
    }

    /// Latest Fear & Greed index value.
    pub async fn fetch_fear_greed(&self) -> Result<Option<i64>> {
        let body = self.get_json("/index/fearGreedIndex", "fear/greed index").await?;
        let index = parse_fear_greed(&body);
        debug!(?index, "fear/greed index fetched");
        Ok(index)
    }

    /// Latest MVRV Z-score for `symbol`.
    pub async fn fetch_mvrv_z_score(&self, symbol: &str) -> Result<Option<f64>> {
        let body = self
            .get_json(&format!("/index/mvrvZScore?symbol={symbol}"), "MVRV Z-score")
            .await?;
        let z = parse_mvrv_z_score(&body);
        debug!(symbol, ?z, "MVRV Z-score fetched");
        Ok(z)
    }
}

impl Default for CoinglassClient {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Pure parsing boundary
// =============================================================================

/// Read a JSON value as f64, accepting both numbers and numeric strings.
fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Last sample's `longShortRate` from the long/short chart payload.  A
/// negative ratio is malformed and yields `None`.
pub fn parse_long_short_ratio(body: &Value) -> Option<f64> {
    let data = body["data"].as_array()?;
    as_number(&data.last()?["longShortRate"]).filter(|r| *r >= 0.0)
}

/// First entry's `rate` from the funding-rate payload.
pub fn parse_funding_rate(body: &Value) -> Option<f64> {
    let data = body["data"].as_array()?;
    as_number(&data.first()?["rate"])
}

/// Outflow ratio `(prev - curr) / prev` from the two most recent holdings
/// samples.  Undefined (`None`) when fewer than two samples exist or the
/// previous holdings are zero or negative.
pub fn parse_holding_change(body: &Value) -> Option<f64> {
    let data = body["data"].as_array()?;
    if data.len() < 2 {
        return None;
    }
    let prev = as_number(&data[data.len() - 2]["holdings"])?;
    let curr = as_number(&data[data.len() - 1]["holdings"])?;
    if prev > 0.0 {
        Some((prev - curr) / prev)
    } else {
        None
    }
}

/// Short share of the last sample's liquidation volume.  A sample with zero
/// total volume yields the neutral 0.5; negative volumes are malformed and
/// yield `None` so the share stays within [0, 1].
pub fn parse_short_liquidation_ratio(body: &Value) -> Option<f64> {
    let data = body["data"].as_array()?;
    let item = data.last()?;
    let long_liq = as_number(&item["longLiquidation"])?;
    let short_liq = as_number(&item["shortLiquidation"])?;
    if long_liq < 0.0 || short_liq < 0.0 {
        return None;
    }
    let total = long_liq + short_liq;
    if total > 0.0 {
        Some(short_liq / total)
    } else {
        Some(0.5)
    }
}

/// Last sample's `value` from the Fear & Greed payload.  Values outside the
/// index's [0, 100] domain are malformed and yield `None`.
pub fn parse_fear_greed(body: &Value) -> Option<i64> {
    let data = body["data"].as_array()?;
    as_number(&data.last()?["value"])
        .map(|v| v.round() as i64)
        .filter(|v| (0..=100).contains(v))
}

/// Last sample's `mvrvZScore` from the MVRV payload.
pub fn parse_mvrv_z_score(body: &Value) -> Option<f64> {
    let data = body["data"].as_array()?;
    as_number(&data.last()?["mvrvZScore"])
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn long_short_uses_last_sample() {
        let body = json!({ "data": [
            { "longShortRate": 0.9 },
            { "longShortRate": "1.12" }
        ]});
        assert!((parse_long_short_ratio(&body).unwrap() - 1.12).abs() < 1e-9);
    }

    #[test]
    fn long_short_negative_ratio_is_unavailable() {
        let body = json!({ "data": [ { "longShortRate": -0.4 } ] });
        assert!(parse_long_short_ratio(&body).is_none());
    }

    #[test]
    fn funding_rate_uses_first_entry() {
        let body = json!({ "data": [ { "rate": 0.0001 }, { "rate": 0.0009 } ] });
        assert!((parse_funding_rate(&body).unwrap() - 0.0001).abs() < 1e-12);
    }

    #[test]
    fn holding_change_outflow_is_positive() {
        let body = json!({ "data": [
            { "holdings": 1000.0 },
            { "holdings": 980.0 }
        ]});
        let change = parse_holding_change(&body).unwrap();
        assert!((change - 0.02).abs() < 1e-9);
    }

    #[test]
    fn holding_change_zero_prev_is_unavailable() {
        // Division guard: zero previous holdings yields None, not a fault.
        let body = json!({ "data": [
            { "holdings": 0.0 },
            { "holdings": 980.0 }
        ]});
        assert!(parse_holding_change(&body).is_none());
    }

    #[test]
    fn holding_change_single_sample_is_unavailable() {
        let body = json!({ "data": [ { "holdings": 1000.0 } ] });
        assert!(parse_holding_change(&body).is_none());
    }

    #[test]
    fn liquidation_ratio_short_share() {
        let body = json!({ "data": [
            { "longLiquidation": 40.0, "shortLiquidation": 60.0 }
        ]});
        assert!((parse_short_liquidation_ratio(&body).unwrap() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn liquidation_ratio_zero_volume_defaults_to_half() {
        let body = json!({ "data": [
            { "longLiquidation": 0.0, "shortLiquidation": 0.0 }
        ]});
        assert!((parse_short_liquidation_ratio(&body).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn liquidation_ratio_negative_volume_is_unavailable() {
        // Malformed upstream data must degrade to None, never escape [0, 1].
        let body = json!({ "data": [
            { "longLiquidation": 50.0, "shortLiquidation": -10.0 }
        ]});
        assert!(parse_short_liquidation_ratio(&body).is_none());

        let body = json!({ "data": [
            { "longLiquidation": -50.0, "shortLiquidation": 60.0 }
        ]});
        assert!(parse_short_liquidation_ratio(&body).is_none());
    }

    #[test]
    fn fear_greed_rounds_to_integer() {
        let body = json!({ "data": [ { "value": 49.6 } ] });
        assert_eq!(parse_fear_greed(&body), Some(50));
    }

    #[test]
    fn fear_greed_out_of_range_is_unavailable() {
        let body = json!({ "data": [ { "value": 140 } ] });
        assert!(parse_fear_greed(&body).is_none());

        let body = json!({ "data": [ { "value": -3 } ] });
        assert!(parse_fear_greed(&body).is_none());
    }

    #[test]
    fn mvrv_z_accepts_string_numbers() {
        let body = json!({ "data": [ { "mvrvZScore": "1.85" } ] });
        assert!((parse_mvrv_z_score(&body).unwrap() - 1.85).abs() < 1e-9);
    }

    #[test]
    fn missing_data_array_is_unavailable() {
        let body = json!({ "code": 40001 });
        assert!(parse_long_short_ratio(&body).is_none());
        assert!(parse_funding_rate(&body).is_none());
        assert!(parse_holding_change(&body).is_none());
        assert!(parse_short_liquidation_ratio(&body).is_none());
        assert!(parse_fear_greed(&body).is_none());
        assert!(parse_mvrv_z_score(&body).is_none());
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let body = json!({ "data": [ { "longShortRate": "NaN" } ] });
        assert!(parse_long_short_ratio(&body).is_none());
    }
}
