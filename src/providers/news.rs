// =============================================================================
// News Feed Client — recent market headlines for the circuit breaker
// =============================================================================

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::types::NewsEvent;

/// Client for the Coinglass market-news feed.
pub struct NewsFeedClient {
    client: reqwest::Client,
    base_url: String,
}

impl NewsFeedClient {
    /// Create a new client with a default HTTP client (4 s timeout).
    pub fn new() -> Self {
        Self::with_client(
            reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(4))
                .build()
                .expect("failed to build reqwest client for NewsFeedClient"),
        )
    }

    /// Create a client that re-uses an existing HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: "https://api.coinglass.com".to_string(),
        }
    }

    /// Fetch the most recent `limit` market headlines, newest first.
    ///
    /// Callers treat a failure here as an empty feed: the breaker is a
    /// best-effort safety check and must never itself halt a run.  The
    /// trade-off is that a feed outage silently disables the breaker.
    pub async fn fetch_recent(&self, limit: usize) -> Result<Vec<NewsEvent>> {
        let url = format!(
            "{}/api/v1/news?category=market&limit={}",
            self.base_url, limit
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET market news")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse news response body")?;

        if !status.is_success() {
            anyhow::bail!("news API returned {}: {}", status, body);
        }

        let events = parse_news(&body);
        debug!(count = events.len(), "news headlines fetched");
        Ok(events)
    }
}

impl Default for NewsFeedClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract headlines from a news payload, preserving feed order.  Items
/// without a title are skipped.
pub fn parse_news(body: &Value) -> Vec<NewsEvent> {
    body["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let title = item["title"].as_str()?;
                    if title.is_empty() {
                        return None;
                    }
                    Some(NewsEvent {
                        title: title.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_news_preserves_feed_order() {
        let body = json!({ "data": [
            { "title": "First headline" },
            { "title": "Second headline" }
        ]});
        let events = parse_news(&body);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "First headline");
        assert_eq!(events[1].title, "Second headline");
    }

    #[test]
    fn parse_news_skips_untitled_items() {
        let body = json!({ "data": [
            { "title": "" },
            { "url": "https://example.com" },
            { "title": "Real headline" }
        ]});
        let events = parse_news(&body);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Real headline");
    }

    #[test]
    fn parse_news_missing_data_is_empty() {
        let body = json!({ "code": 500 });
        assert!(parse_news(&body).is_empty());
    }
}
