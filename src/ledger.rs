// src/ledger.rs
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Persistent set of already-distributed deal links, keyed by `link`.
///
/// The ledger exists purely to gate re-posting: the orchestrator checks
/// `exists` before distribution, records with `add` after it, and lets
/// `evict_older_than` reopen links after the retention window so deals can
/// run again.
#[derive(Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Open (or create) the ledger database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .context("opening ledger database")?;
        Ok(Self { pool })
    }

    /// In-memory ledger for tests. A single connection keeps the database
    /// alive for the pool's lifetime.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("opening in-memory ledger")?;
        Ok(Self { pool })
    }

    /// Create the schema if absent. Failure here is the one fatal ledger
    /// error: the process must not enter the loop without a working table.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS deals (
                link TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                post_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await
        .context("creating deals table")?;
        Ok(())
    }

    /// Whether `link` has already been distributed.
    ///
    /// Fails open: a storage error is logged and reported as "not found",
    /// trading a possible duplicate post for a pipeline that keeps moving.
    pub async fn exists(&self, link: &str) -> bool {
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM deals WHERE link = ?")
            .bind(link)
            .fetch_optional(&self.pool)
            .await;
        match row {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, link, "ledger lookup failed, treating as new");
                false
            }
        }
    }

    /// Record a distributed deal. Idempotent: re-adding an existing link is
    /// a silent no-op and never changes the stored title. Storage errors are
    /// logged and swallowed.
    pub async fn add(&self, link: &str, title: &str) {
        let res = sqlx::query("INSERT OR IGNORE INTO deals (link, title) VALUES (?, ?)")
            .bind(link)
            .bind(title)
            .execute(&self.pool)
            .await;
        if let Err(e) = res {
            tracing::warn!(error = %e, link, "failed to record deal in ledger");
        }
    }

    /// Delete records strictly older than `hours`, reopening their links for
    /// reposting. Returns the number removed; zero on storage errors.
    pub async fn evict_older_than(&self, hours: u32) -> u64 {
        let modifier = format!("-{hours} hours");
        let res = sqlx::query("DELETE FROM deals WHERE post_date < datetime('now', ?)")
            .bind(&modifier)
            .execute(&self.pool)
            .await;
        match res {
            Ok(done) => {
                let removed = done.rows_affected();
                if removed > 0 {
                    tracing::info!(removed, hours, "evicted expired deals from ledger");
                }
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, "ledger eviction failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fresh() -> Ledger {
        let ledger = Ledger::open_in_memory().await.unwrap();
        ledger.init().await.unwrap();
        ledger
    }

    /// Insert a row with a backdated post_date, bypassing the default.
    async fn add_aged(ledger: &Ledger, link: &str, hours_ago: u32) {
        sqlx::query(
            "INSERT OR IGNORE INTO deals (link, title, post_date)
             VALUES (?, 'aged', datetime('now', ?))",
        )
        .bind(link)
        .bind(format!("-{hours_ago} hours"))
        .execute(&ledger.pool)
        .await
        .unwrap();
    }

    async fn stored_title(ledger: &Ledger, link: &str) -> String {
        sqlx::query_scalar::<_, String>("SELECT title FROM deals WHERE link = ?")
            .bind(link)
            .fetch_one(&ledger.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_then_exists() {
        let ledger = fresh().await;
        assert!(!ledger.exists("https://ex.com/a").await);
        ledger.add("https://ex.com/a", "Deal A").await;
        assert!(ledger.exists("https://ex.com/a").await);
    }

    #[tokio::test]
    async fn duplicate_add_keeps_original_title() {
        let ledger = fresh().await;
        ledger.add("https://ex.com/a", "First title").await;
        ledger.add("https://ex.com/a", "Second title").await;
        assert_eq!(stored_title(&ledger, "https://ex.com/a").await, "First title");
    }

    #[tokio::test]
    async fn eviction_removes_only_strictly_older_rows() {
        let ledger = fresh().await;
        add_aged(&ledger, "old", 49).await;
        add_aged(&ledger, "young", 2).await;
        ledger.add("now", "fresh").await;

        assert_eq!(ledger.evict_older_than(48).await, 1);
        assert!(!ledger.exists("old").await);
        assert!(ledger.exists("young").await);
        assert!(ledger.exists("now").await);

        // Second sweep finds nothing left to remove.
        assert_eq!(ledger.evict_older_than(48).await, 0);
    }
}
