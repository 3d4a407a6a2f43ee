// =============================================================================
// Signal Evaluator — the six-condition long gate
// =============================================================================
//
// Evaluates six independent boolean conditions against a fully-resolved
// metric snapshot and combines them with logical AND:
//
//   1. trend_volatility    — price rose and ATR is below 2% of price
//   2. positioning         — top-trader long/short ratio inside [0.8, 1.3]
//   3. funding             — funding rate inside [-0.03%, +0.05%]
//   4. oi_outflow          — open interest shrank by at least 1%
//   5. short_liquidations  — shorts took more than 55% of liquidation volume
//   6. sentiment           — fear/greed inside [20, 80] and MVRV-Z in [-2, 3]
//
// A condition whose required metric is unavailable evaluates to false —
// never indeterminate, never an error.  The evaluator is a pure function
// with no retry and no state; the only error surface is Invalid-Input for
// snapshots that violate the input contract (non-finite or out-of-domain
// values), which is the caller's bug, not a data-quality event.
// =============================================================================

use anyhow::Result;
use serde::Serialize;

use crate::config::SignalParams;
use crate::types::{DerivativesMetrics, MarketSnapshot, SentimentMetrics};

/// Verdict and diagnostics for a single gate condition.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionCheck {
    /// Stable machine-readable identifier.
    pub code: &'static str,

    /// Human-readable label for reports.
    pub label: &'static str,

    pub passed: bool,

    /// The underlying value(s), or "data unavailable".
    pub detail: String,
}

/// Result of one gate evaluation: all six condition checks plus their
/// conjunction.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub checks: Vec<ConditionCheck>,
    pub long_signal: bool,
}

impl Evaluation {
    /// Look up a check by its stable code.
    pub fn check(&self, code: &str) -> Option<&ConditionCheck> {
        self.checks.iter().find(|c| c.code == code)
    }
}

const UNAVAILABLE: &str = "data unavailable";

/// Evaluate the six-condition gate.
///
/// Errors only on Invalid-Input: a supplied (`Some`) value that is
/// non-finite or outside its documented domain.  Missing (`None`) values are
/// valid and simply fail their dependent conditions.
pub fn evaluate(
    market: &MarketSnapshot,
    derivatives: &DerivativesMetrics,
    sentiment: &SentimentMetrics,
    params: &SignalParams,
) -> Result<Evaluation> {
    validate_inputs(market, derivatives, sentiment)?;

    let mut checks = Vec::with_capacity(6);

    // ── 1. Price trend + bounded volatility ──────────────────────────────
    checks.push(match (market.price, market.prev_price, market.atr) {
        (Some(price), Some(prev), Some(atr)) => {
            let cap = price * params.max_atr_price_frac;
            ConditionCheck {
                code: "trend_volatility",
                label: "Price trend + bounded volatility",
                passed: price > prev && atr < cap,
                detail: format!(
                    "price {price:.1} vs prev {prev:.1}, ATR {atr:.1} vs cap {cap:.1}"
                ),
            }
        }
        _ => unavailable("trend_volatility", "Price trend + bounded volatility"),
    });

    // ── 2. Balanced crowd positioning ────────────────────────────────────
    checks.push(match derivatives.long_short_ratio {
        Some(ratio) => ConditionCheck {
            code: "positioning",
            label: "Balanced crowd positioning",
            passed: ratio >= params.long_short_min && ratio <= params.long_short_max,
            detail: format!("long/short ratio {ratio:.2}"),
        },
        None => unavailable("positioning", "Balanced crowd positioning"),
    });

    // ── 3. Neutral funding ───────────────────────────────────────────────
    checks.push(match derivatives.funding_rate {
        Some(rate) => ConditionCheck {
            code: "funding",
            label: "Neutral funding",
            passed: rate >= params.funding_min && rate <= params.funding_max,
            detail: format!("funding rate {rate:.5}"),
        },
        None => unavailable("funding", "Neutral funding"),
    });

    // ── 4. Open-interest outflow ─────────────────────────────────────────
    checks.push(match derivatives.holding_change_ratio {
        Some(change) => ConditionCheck {
            code: "oi_outflow",
            label: "Open-interest outflow",
            passed: change >= params.min_holding_outflow,
            detail: format!("OI outflow {:.1}%", change * 100.0),
        },
        None => unavailable("oi_outflow", "Open-interest outflow"),
    });

    // ── 5. Short-side liquidation dominance ──────────────────────────────
    checks.push(match derivatives.short_liquidation_ratio {
        Some(share) => ConditionCheck {
            code: "short_liquidations",
            label: "Short-side liquidation dominance",
            passed: share > params.min_short_liquidation_share,
            detail: format!("short liquidation share {:.1}%", share * 100.0),
        },
        None => unavailable("short_liquidations", "Short-side liquidation dominance"),
    });

    // ── 6. Sentiment neutrality ──────────────────────────────────────────
    checks.push(match (sentiment.fear_greed_index, sentiment.mvrv_z_score) {
        (Some(fg), Some(z)) => ConditionCheck {
            code: "sentiment",
            label: "Sentiment neutrality",
            passed: fg >= params.fear_greed_min
                && fg <= params.fear_greed_max
                && z >= params.mvrv_z_min
                && z <= params.mvrv_z_max,
            detail: format!("fear/greed {fg}, MVRV-Z {z:.1}"),
        },
        _ => unavailable("sentiment", "Sentiment neutrality"),
    });

    let long_signal = checks.iter().all(|c| c.passed);

    Ok(Evaluation {
        checks,
        long_signal,
    })
}

fn unavailable(code: &'static str, label: &'static str) -> ConditionCheck {
    ConditionCheck {
        code,
        label,
        passed: false,
        detail: UNAVAILABLE.to_string(),
    }
}

/// Reject snapshots that violate the input contract.  Each offending field
/// is named so the caller can trace the bug to its source.
fn validate_inputs(
    market: &MarketSnapshot,
    derivatives: &DerivativesMetrics,
    sentiment: &SentimentMetrics,
) -> Result<()> {
    if let Some(price) = market.price {
        if !price.is_finite() || price <= 0.0 {
            anyhow::bail!("invalid input: price must be positive and finite (got {price})");
        }
    }
    if let Some(prev) = market.prev_price {
        if !prev.is_finite() || prev <= 0.0 {
            anyhow::bail!("invalid input: prev_price must be positive and finite (got {prev})");
        }
    }
    if let Some(atr) = market.atr {
        if !atr.is_finite() || atr < 0.0 {
            anyhow::bail!("invalid input: atr must be non-negative and finite (got {atr})");
        }
    }
    if let Some(ratio) = derivatives.long_short_ratio {
        if !ratio.is_finite() || ratio < 0.0 {
            anyhow::bail!(
                "invalid input: long_short_ratio must be non-negative and finite (got {ratio})"
            );
        }
    }
    if let Some(rate) = derivatives.funding_rate {
        if !rate.is_finite() {
            anyhow::bail!("invalid input: funding_rate must be finite (got {rate})");
        }
    }
    if let Some(change) = derivatives.holding_change_ratio {
        if !change.is_finite() {
            anyhow::bail!("invalid input: holding_change_ratio must be finite (got {change})");
        }
    }
    if let Some(share) = derivatives.short_liquidation_ratio {
        if !share.is_finite() || !(0.0..=1.0).contains(&share) {
            anyhow::bail!(
                "invalid input: short_liquidation_ratio must be within [0, 1] (got {share})"
            );
        }
    }
    if let Some(fg) = sentiment.fear_greed_index {
        if !(0..=100).contains(&fg) {
            anyhow::bail!("invalid input: fear_greed_index must be within [0, 100] (got {fg})");
        }
    }
    if let Some(z) = sentiment.mvrv_z_score {
        if !z.is_finite() {
            anyhow::bail!("invalid input: mvrv_z_score must be finite (got {z})");
        }
    }
    Ok(())
}
