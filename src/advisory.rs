// =============================================================================
// Advisory Composer — reports and entry/target/stop recommendations
// =============================================================================
//
// Turns an evaluation into the text artifacts a run can emit:
//
//   - an evaluation report listing every condition's verdict and values
//   - a breaker notice when the news circuit breaker pre-empted the run
//   - a position recommendation when the gate fired
//
// Target and stop use fixed policy multipliers on the entry price (+2.2% /
// -2.1%), independent of volatility.  Output is advisory text only; nothing
// here sizes a position or places an order.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::breaker::BreakerTrip;
use crate::config::SignalParams;
use crate::evaluator::Evaluation;
use crate::types::MarketSnapshot;

/// Suggested entry/target/stop set for a fired signal.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PositionAdvice {
    pub entry: f64,
    pub target: f64,
    pub stop: f64,

    /// Target distance as a signed percentage of entry (e.g. 2.2).
    pub target_pct: f64,

    /// Stop distance as a signed percentage of entry (e.g. -2.1).
    pub stop_pct: f64,
}

/// Compute the fixed-multiplier advice set for an entry at `price`.
pub fn position_advice(price: f64, params: &SignalParams) -> PositionAdvice {
    PositionAdvice {
        entry: price,
        target: price * params.target_multiplier,
        stop: price * params.stop_multiplier,
        target_pct: (params.target_multiplier - 1.0) * 100.0,
        stop_pct: (params.stop_multiplier - 1.0) * 100.0,
    }
}

/// Render the per-run evaluation report (Telegram Markdown).
///
/// Every condition is always listed — metrics that were unavailable this run
/// show their diagnostic instead of being omitted.
pub fn compose_report(
    instrument: &str,
    market: &MarketSnapshot,
    evaluation: &Evaluation,
    at: DateTime<Utc>,
) -> String {
    let price_line = match market.price {
        Some(price) => format!("{price:.0} USDT"),
        None => "unavailable".to_string(),
    };

    let mut report = format!(
        "🚨 *Helios Sentinel* evaluation report\n\n\
         🕒 Time: {}\n\
         📦 Instrument: {}\n\
         💰 Last price: {}\n\
         📊 Gate status:\n",
        at.format("%Y-%m-%d %H:%M UTC"),
        instrument,
        price_line,
    );

    for check in &evaluation.checks {
        let mark = if check.passed { "✅" } else { "❌" };
        report.push_str(&format!("  {} {} — {}\n", mark, check.label, check.detail));
    }

    let verdict = if evaluation.long_signal {
        "✅ all conditions met"
    } else {
        "❌ not triggered"
    };
    report.push_str(&format!("\n🔔 Verdict: {verdict}"));

    report
}

/// Render the recommendation message for a fired signal.
pub fn compose_recommendation(instrument: &str, advice: &PositionAdvice) -> String {
    format!(
        "🎯 *Advisory*: favorable long setup on {}.\n\
         Consider a manual long entry near {:.0}, \
         take-profit {:.0} ({:+.1}%), stop {:.0} ({:+.1}%).\n\
         No order has been placed.",
        instrument, advice.entry, advice.target, advice.target_pct, advice.stop, advice.stop_pct,
    )
}

/// Render the notice emitted when the news circuit breaker trips.
pub fn compose_breaker_notice(trip: &BreakerTrip) -> String {
    format!(
        "⚠️ *Event circuit breaker tripped*\n\
         📰 {}\n\
         ⏸️ Signal evaluation skipped for this run.",
        trip.headline,
    )
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalParams;
    use crate::evaluator::evaluate;
    use crate::types::{DerivativesMetrics, SentimentMetrics};
    use chrono::TimeZone;

    #[test]
    fn advice_applies_fixed_multipliers() {
        let advice = position_advice(50_000.0, &SignalParams::default());
        assert!((advice.target - 51_100.0).abs() < 1e-6);
        assert!((advice.stop - 48_950.0).abs() < 1e-6);
        assert!((advice.target_pct - 2.2).abs() < 1e-9);
        assert!((advice.stop_pct - -2.1).abs() < 1e-9);
    }

    #[test]
    fn advice_for_end_to_end_scenario_price() {
        let advice = position_advice(50_500.0, &SignalParams::default());
        assert!((advice.target - 51_611.0).abs() < 1e-6);
        assert!((advice.stop - 49_439.5).abs() < 1e-6);
    }

    #[test]
    fn report_lists_failed_condition_with_value() {
        let market = MarketSnapshot {
            price: Some(50_500.0),
            prev_price: Some(50_000.0),
            atr: Some(500.0),
        };
        let derivatives = DerivativesMetrics {
            long_short_ratio: Some(1.0),
            funding_rate: Some(0.001), // outside the band
            holding_change_ratio: Some(0.02),
            short_liquidation_ratio: Some(0.6),
        };
        let sentiment = SentimentMetrics {
            fear_greed_index: Some(50),
            mvrv_z_score: Some(0.0),
        };
        let eval = evaluate(&market, &derivatives, &sentiment, &SignalParams::default()).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let report = compose_report("BTC-USDT-SWAP", &market, &eval, at);

        assert!(report.contains("❌ Neutral funding — funding rate 0.00100"));
        assert!(report.contains("❌ not triggered"));
        assert!(report.contains("50500 USDT"));
    }

    #[test]
    fn report_shows_unavailable_metrics() {
        let market = MarketSnapshot::default();
        let eval = evaluate(
            &market,
            &DerivativesMetrics::default(),
            &SentimentMetrics::default(),
            &SignalParams::default(),
        )
        .unwrap();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let report = compose_report("BTC-USDT-SWAP", &market, &eval, at);

        assert!(report.contains("Last price: unavailable"));
        // All six conditions stay listed even with no data at all.
        assert_eq!(report.matches("data unavailable").count(), 6);
    }

    #[test]
    fn breaker_notice_carries_headline() {
        let trip = BreakerTrip {
            headline: "Major exchange policy shift".to_string(),
            keyword: "policy".to_string(),
        };
        let notice = compose_breaker_notice(&trip);
        assert!(notice.contains("Major exchange policy shift"));
        assert!(notice.contains("circuit breaker"));
    }

    #[test]
    fn recommendation_mentions_no_order_placed() {
        let advice = position_advice(50_000.0, &SignalParams::default());
        let msg = compose_recommendation("BTC-USDT-SWAP", &advice);
        assert!(msg.contains("51100"));
        assert!(msg.contains("48950"));
        assert!(msg.contains("No order has been placed"));
    }
}
