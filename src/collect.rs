// src/collect.rs
//! Runs every configured source once per cycle, isolating failures so one
//! broken storefront never costs the others their batch.

use crate::alert::ErrorNotifier;
use crate::model::Deal;
use crate::sources::SourceAdapter;

/// Fetch from all sources in configured order, concatenating results.
/// Per-source errors are logged and alerted; `release_resources` runs
/// unconditionally after each fetch attempt.
pub async fn collect(sources: &[Box<dyn SourceAdapter>], alerts: &ErrorNotifier) -> Vec<Deal> {
    let mut all_deals = Vec::new();

    for source in sources {
        tracing::info!(source = source.name(), "running source");

        match source.fetch().await {
            Ok(deals) => {
                if deals.is_empty() {
                    tracing::info!(source = source.name(), "no deals found");
                } else {
                    tracing::info!(source = source.name(), count = deals.len(), "deals found");
                    all_deals.extend(deals);
                }
            }
            Err(e) => {
                tracing::error!(source = source.name(), error = %e, "source fetch failed");
                alerts
                    .report(&e, &format!("Execução do scraper {}", source.name()))
                    .await;
            }
        }

        source.release_resources().await;
    }

    all_deals
}
