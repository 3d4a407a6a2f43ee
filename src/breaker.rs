// =============================================================================
// News Circuit Breaker — headline keyword scan that pre-empts evaluation
// =============================================================================
//
// Scans recent headlines for configured trigger keywords (asset-transfer
// terms, policy terms, named exchanges, tax/subsidy terms).  A match means a
// major market event is in flight and the gate must not be evaluated this
// run.  The scan is a pure function over its inputs; retrieval failures are
// handled upstream by passing an empty feed (fail-open).
// =============================================================================

use serde::Serialize;

use crate::types::NewsEvent;

/// The headline that tripped the breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerTrip {
    /// First matching headline in feed order.
    pub headline: String,

    /// The keyword that matched it.
    pub keyword: String,
}

/// Scan `events` in feed order and return the first headline containing any
/// of `keywords`, case-insensitively.  Returns `None` for an empty feed or
/// when nothing matches.
pub fn scan(events: &[NewsEvent], keywords: &[String]) -> Option<BreakerTrip> {
    for event in events {
        let title_lower = event.title.to_lowercase();
        for keyword in keywords {
            if keyword.is_empty() {
                continue;
            }
            if title_lower.contains(&keyword.to_lowercase()) {
                return Some(BreakerTrip {
                    headline: event.title.clone(),
                    keyword: keyword.clone(),
                });
            }
        }
    }
    None
}
