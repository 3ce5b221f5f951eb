// src/orchestrator.rs
//! The operating loop: window check → ledger eviction → collect → filter →
//! distribute → randomized sleep. Runs until the cancellation token fires;
//! every sleep races shutdown so the process stops promptly.

use chrono::Local;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::alert::ErrorNotifier;
use crate::channels;
use crate::collect::collect;
use crate::config::Settings;
use crate::distribute::Distributor;
use crate::filter::filter_deals;
use crate::ledger::Ledger;
use crate::schedule::{check_window, WindowCheck};
use crate::sources;

/// Ledger retention: links older than this are reopened for reposting.
const RETENTION_HOURS: u32 = 48;
/// Short wait before retrying when no sources are configured.
const NO_SOURCES_SLEEP: Duration = Duration::from_secs(60);
const CYCLE_MIN_MINUTES: u64 = 20;
const CYCLE_MAX_MINUTES: u64 = 40;

/// How a cycle body ended, so `run` knows whether the full inter-cycle
/// sleep applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    Completed,
    /// No sources were configured; the short fallback sleep already
    /// happened and the loop should retry immediately.
    SkippedNoSources,
}

pub struct Orchestrator {
    ledger: Ledger,
    alerts: ErrorNotifier,
    distributor: Distributor,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(ledger: Ledger, alerts: ErrorNotifier, cancel: CancellationToken) -> Self {
        Self {
            ledger,
            alerts,
            distributor: Distributor::new(cancel.clone()),
            cancel,
        }
    }

    pub async fn run(&self) {
        tracing::info!(
            "starting operating loop (interval {CYCLE_MIN_MINUTES}-{CYCLE_MAX_MINUTES} min)"
        );

        while !self.cancel.is_cancelled() {
            // Settings are re-read from the process environment every cycle.
            let settings = Settings::from_env();

            let now = Local::now().naive_local();
            match check_window(
                settings.execution_start_hour.as_deref(),
                settings.execution_end_hour.as_deref(),
                now,
            ) {
                Ok(WindowCheck::Open) => {}
                Ok(WindowCheck::Closed { reopen_at }) => {
                    let wait = (reopen_at - now)
                        .to_std()
                        .unwrap_or(Duration::from_secs(60));
                    let wait_hours = wait.as_secs_f64() / 3600.0;
                    tracing::info!(
                        reopen_at = %reopen_at.format("%d/%m/%Y %H:%M:%S"),
                        wait_hours,
                        "outside the operating window, waiting"
                    );
                    self.sleep_or_stop(wait).await;
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "invalid execution window, ignoring it this cycle");
                    self.alerts.report(&e, "Configuração de Horário").await;
                }
            }

            if self.run_cycle(&settings).await == CycleOutcome::SkippedNoSources {
                // Retry right after the short fallback wait instead of
                // burning a full inter-cycle sleep on a misconfiguration.
                continue;
            }

            let minutes = rand::rng().random_range(CYCLE_MIN_MINUTES..=CYCLE_MAX_MINUTES);
            tracing::info!(minutes, "cycle finished, sleeping until the next one");
            self.sleep_or_stop(Duration::from_secs(minutes * 60)).await;
        }

        tracing::info!("operating loop stopped");
    }

    async fn run_cycle(&self, settings: &Settings) -> CycleOutcome {
        tracing::info!("starting new cycle");
        self.ledger.evict_older_than(RETENTION_HOURS).await;

        let sources = sources::build_sources(settings);
        if sources.is_empty() {
            tracing::error!("no sources configured, check the source settings in .env");
            self.alerts
                .report(
                    &anyhow::anyhow!("no sources configured"),
                    "Configuração de Scrapers",
                )
                .await;
            self.sleep_or_stop(NO_SOURCES_SLEEP).await;
            return CycleOutcome::SkippedNoSources;
        }

        tracing::info!(sources = sources.len(), "collecting deals");
        let deals = collect(&sources, &self.alerts).await;
        if deals.is_empty() {
            tracing::info!("no deals collected this cycle");
            return CycleOutcome::Completed;
        }

        tracing::info!(collected = deals.len(), "checking for duplicates and price floor");
        let survivors = filter_deals(&self.ledger, deals, settings.min_price_to_post).await;

        let channels = channels::build_channels(settings);
        self.distributor
            .deliver(&survivors, &channels, &self.ledger, &self.alerts)
            .await;
        CycleOutcome::Completed
    }

    /// Sleep unless shutdown arrives first. Returns `false` on shutdown.
    async fn sleep_or_stop(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_source_settings() -> Settings {
        Settings {
            execution_start_hour: None,
            execution_end_hour: None,
            default_products_limit: 2,
            min_price_to_post: 0.0,
            mercado_livre_url: None,
            mercado_livre_limit: None,
            magazine_luiza_url: None,
            magazine_luiza_limit: None,
            shopee_app_id: None,
            shopee_app_secret: None,
            shopee_limit: None,
            shopee_min_sales: 10,
            shopee_min_rating: 4.0,
            post_to_whatsapp: false,
            post_to_instagram: false,
            post_to_facebook: false,
            evolution: None,
            whatsapp_chat_id: None,
            whatsapp_chat_id_test: None,
            whatsapp_error_group_id: None,
            app_env: "production".into(),
        }
    }

    async fn test_orchestrator() -> Orchestrator {
        let ledger = Ledger::open_in_memory().await.unwrap();
        ledger.init().await.unwrap();
        Orchestrator::new(ledger, ErrorNotifier::disabled(), CancellationToken::new())
    }

    #[tokio::test]
    async fn zero_sources_skips_the_cycle_after_a_short_wait() {
        let orchestrator = test_orchestrator().await;
        // Pause only after the ledger is open: sqlx's connection setup runs on
        // a blocking thread, and auto-advanced paused time trips the pool's
        // acquire timeout before it finishes.
        tokio::time::pause();

        let start = tokio::time::Instant::now();
        let outcome = orchestrator.run_cycle(&no_source_settings()).await;

        assert_eq!(outcome, CycleOutcome::SkippedNoSources);
        // The short fallback wait happens inside the cycle; the caller then
        // retries without the 20-40 min inter-cycle sleep.
        assert!(start.elapsed() >= NO_SOURCES_SLEEP);
        assert!(start.elapsed() < Duration::from_secs(CYCLE_MIN_MINUTES * 60));
    }

    #[tokio::test]
    async fn zero_sources_cycle_stops_immediately_on_shutdown() {
        let orchestrator = test_orchestrator().await;
        tokio::time::pause();
        orchestrator.cancel.cancel();

        let start = tokio::time::Instant::now();
        let outcome = orchestrator.run_cycle(&no_source_settings()).await;

        assert_eq!(outcome, CycleOutcome::SkippedNoSources);
        assert!(start.elapsed() < NO_SOURCES_SLEEP);
    }
}
