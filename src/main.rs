// =============================================================================
// Helios Sentinel — Main Entry Point
// =============================================================================
//
// Advisory-only long-signal sentinel for a single perpetual instrument.
// Every run combines a news circuit breaker with a six-condition gate and
// delivers the verdict over Telegram.  No orders are ever placed.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod advisory;
mod api;
mod app_state;
mod breaker;
mod config;
mod evaluator;
mod indicators;
mod notifier;
mod pipeline;
mod providers;
mod snapshot;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::SentinelConfig;
use crate::notifier::TelegramNotifier;
use crate::pipeline::Sentinel;
use crate::providers::{CoinglassClient, NewsFeedClient, OkxMarketClient};
use crate::snapshot::SnapshotBuilder;

const CONFIG_PATH: &str = "sentinel_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║            Helios Sentinel — Starting Up                ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = SentinelConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        SentinelConfig::default()
    });

    // Override the instrument from env if available.
    if let Ok(instrument) = std::env::var("HELIOS_INSTRUMENT") {
        let instrument = instrument.trim().to_uppercase();
        if !instrument.is_empty() {
            config.instrument = instrument;
        }
    }

    info!(
        instrument = %config.instrument,
        bar = %config.bar,
        run_interval_secs = config.run_interval_secs,
        "Configured sentinel"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config));

    // ── 3. Build providers & notifier ────────────────────────────────────
    // Telegram credentials are read here, once per process, and injected
    // into the notifier; no other module touches the environment.
    let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok();
    let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok();
    let notifier = TelegramNotifier::new(bot_token, chat_id);

    let sentinel = Arc::new(Sentinel::new(
        state.clone(),
        SnapshotBuilder::new(OkxMarketClient::new(), CoinglassClient::new()),
        NewsFeedClient::new(),
        notifier,
    ));

    // ── 4. Start the API server ──────────────────────────────────────────
    let bind_addr =
        std::env::var("HELIOS_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());
    let api_app = state.clone();
    let api_sentinel = sentinel.clone();
    let bind_addr_clone = bind_addr.clone();

    tokio::spawn(async move {
        let app = api::rest::router(api_app, api_sentinel);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app)
            .await
            .expect("API server failed");
    });

    // ── 5. Scheduler loop ────────────────────────────────────────────────
    let sched_state = state.clone();
    let sched_sentinel = sentinel.clone();
    tokio::spawn(async move {
        let interval_secs = sched_state.config.read().run_interval_secs;
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(interval_secs.max(1)));

        loop {
            interval.tick().await;

            match sched_sentinel.run_once().await {
                Ok(record) => {
                    info!(run_id = %record.id, outcome = %record.outcome, "scheduled run finished");
                }
                Err(e) => {
                    error!(error = %e, "scheduled run failed");
                }
            }
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Err(e) = state.config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save sentinel config on shutdown");
    }

    info!("Helios Sentinel shut down complete.");
    Ok(())
}
