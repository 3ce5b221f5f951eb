// src/distribute.rs
//! Delivers each surviving deal to every enabled channel, retrying transient
//! channel failures, then records the deal in the ledger and paces before
//! the next one.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::alert::ErrorNotifier;
use crate::channels::ChannelAdapter;
use crate::ledger::Ledger;
use crate::model::Deal;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_PACING: Duration = Duration::from_secs(10);

pub struct Distributor {
    max_attempts: u32,
    retry_delay: Duration,
    /// Gap between deals, to stay under the destination platforms' rate
    /// limits.
    pacing: Duration,
    cancel: CancellationToken,
}

impl Distributor {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            pacing: DEFAULT_PACING,
            cancel,
        }
    }

    pub fn with_timings(mut self, retry_delay: Duration, pacing: Duration) -> Self {
        self.retry_delay = retry_delay;
        self.pacing = pacing;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Deliver `deals` in order to every channel in order. A channel failure
    /// (after retries) is logged and alerted but blocks nothing; every deal
    /// is recorded in the ledger once its channel attempts are done,
    /// whatever their outcomes.
    pub async fn deliver(
        &self,
        deals: &[Deal],
        channels: &[Box<dyn ChannelAdapter>],
        ledger: &Ledger,
        alerts: &ErrorNotifier,
    ) {
        if deals.is_empty() {
            tracing::info!("no new deals to post");
            return;
        }
        if channels.is_empty() {
            tracing::info!("no posting channels enabled, deals will not be sent");
            return;
        }

        tracing::info!(
            deals = deals.len(),
            channels = channels.len(),
            "posting new deals"
        );

        for (i, deal) in deals.iter().enumerate() {
            tracing::info!(
                n = i + 1,
                total = deals.len(),
                title = %deal.title,
                "posting deal"
            );

            for channel in channels {
                if let Err(e) = self.post_with_retry(channel.as_ref(), deal).await {
                    tracing::error!(
                        channel = channel.name(),
                        title = %deal.title,
                        error = %e,
                        "channel delivery failed"
                    );
                    alerts
                        .report(&e, &format!("Postagem com {}", channel.name()))
                        .await;
                }
            }

            // Recorded even when every channel failed: guaranteed
            // non-repetition until the retention sweep reopens the link.
            ledger.add(&deal.link, &deal.title).await;
            tracing::info!(title = %deal.title, "deal recorded in ledger");

            if i + 1 < deals.len() && !self.pause(self.pacing).await {
                tracing::info!("distribution interrupted by shutdown");
                return;
            }
        }
    }

    /// Up to `max_attempts` posts with a fixed delay in between; the last
    /// error is surfaced to the caller.
    async fn post_with_retry(
        &self,
        channel: &dyn ChannelAdapter,
        deal: &Deal,
    ) -> anyhow::Result<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match channel.post(deal).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        channel = channel.name(),
                        attempt,
                        max = self.max_attempts,
                        error = %e,
                        "post attempt failed"
                    );
                    if attempt >= self.max_attempts || !self.pause(self.retry_delay).await {
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Sleep unless shutdown arrives first. Returns `false` on shutdown.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
