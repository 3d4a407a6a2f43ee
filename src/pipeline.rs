// =============================================================================
// Evaluation Pipeline — one complete sentinel run
// =============================================================================
//
// Stages, in order:
//
//   1. Fetch recent headlines and run the circuit breaker.  A trip
//      short-circuits the run: no metrics are fetched, the evaluator is not
//      invoked, and only a breaker notice is emitted.
//   2. Resolve all metrics concurrently into nullable snapshots.
//   3. Evaluate the six-condition gate.
//   4. Compose the report (plus a recommendation when the gate fired) and
//      hand both to the notifier.
//   5. Push a RunRecord into shared state for the dashboard API.
//
// Each run is independent: nothing carries over between invocations, and
// re-entry is driven entirely by the scheduler or the HTTP trigger.
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::advisory;
use crate::app_state::{AppState, RunRecord};
use crate::breaker;
use crate::evaluator;
use crate::notifier::TelegramNotifier;
use crate::providers::NewsFeedClient;
use crate::snapshot::SnapshotBuilder;
use crate::types::RunOutcome;

/// The sentinel engine: owns the provider clients and the notifier, runs
/// the pipeline once per invocation.
pub struct Sentinel {
    state: Arc<AppState>,
    snapshots: SnapshotBuilder,
    news: NewsFeedClient,
    notifier: TelegramNotifier,
}

impl Sentinel {
    pub fn new(
        state: Arc<AppState>,
        snapshots: SnapshotBuilder,
        news: NewsFeedClient,
        notifier: TelegramNotifier,
    ) -> Self {
        Self {
            state,
            snapshots,
            news,
            notifier,
        }
    }

    /// Execute one evaluation run end to end.
    ///
    /// Only Invalid-Input contract violations surface as errors; every
    /// provider-level failure degrades to "unavailable" inside the run.
    pub async fn run_once(&self) -> Result<RunRecord> {
        let config = self.state.config.read().clone();
        info!(instrument = %config.instrument, "sentinel run starting");

        // ── 1. Circuit breaker (strictly before any metric work) ─────────
        // A feed failure yields an empty scan: the breaker fails open, so a
        // news-provider outage silently disables this safety check.
        let events = match self.news.fetch_recent(config.news_limit).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "news feed unavailable — breaker check skipped (fail-open)");
                Vec::new()
            }
        };

        if let Some(trip) = breaker::scan(&events, &config.news_keywords) {
            warn!(headline = %trip.headline, keyword = %trip.keyword, "circuit breaker tripped");

            let notice = advisory::compose_breaker_notice(&trip);
            self.notifier.send(&notice).await;

            let record = RunRecord {
                id: uuid::Uuid::new_v4().to_string(),
                at: Utc::now().to_rfc3339(),
                instrument: config.instrument.clone(),
                outcome: RunOutcome::BreakerTripped {
                    headline: trip.headline,
                },
                report: notice,
                advice: None,
            };
            self.state.push_run(record.clone());
            return Ok(record);
        }

        // ── 2. Resolve metrics ───────────────────────────────────────────
        let (market, derivatives, sentiment) = self.snapshots.build(&config).await;

        // ── 3. Evaluate the gate ─────────────────────────────────────────
        let evaluation =
            evaluator::evaluate(&market, &derivatives, &sentiment, &config.signal_params)
                .context("gate evaluation rejected the snapshot")
                .inspect_err(|e| self.state.push_error(format!("{e:#}")))?;

        info!(
            long_signal = evaluation.long_signal,
            passed = evaluation.checks.iter().filter(|c| c.passed).count(),
            "gate evaluated"
        );

        // ── 4. Compose + deliver ─────────────────────────────────────────
        let report =
            advisory::compose_report(&config.instrument, &market, &evaluation, Utc::now());
        self.notifier.send(&report).await;

        let advice = match (evaluation.long_signal, market.price) {
            (true, Some(price)) => {
                let advice = advisory::position_advice(price, &config.signal_params);
                let message = advisory::compose_recommendation(&config.instrument, &advice);
                self.notifier.send(&message).await;
                info!(
                    entry = advice.entry,
                    target = advice.target,
                    stop = advice.stop,
                    "long recommendation emitted"
                );
                Some(advice)
            }
            _ => None,
        };

        // ── 5. Record ────────────────────────────────────────────────────
        let record = RunRecord {
            id: uuid::Uuid::new_v4().to_string(),
            at: Utc::now().to_rfc3339(),
            instrument: config.instrument.clone(),
            outcome: RunOutcome::Evaluated {
                long_signal: evaluation.long_signal,
            },
            report,
            advice,
        };
        self.state.push_run(record.clone());

        info!(outcome = %record.outcome, "sentinel run complete");
        Ok(record)
    }
}
