//! offerflow — binary entrypoint.
//! Bootstraps the activity log, the dedup ledger, and the error notifier,
//! then hands control to the operating loop until SIGINT.

use tokio_util::sync::CancellationToken;

use offerflow::alert::ErrorNotifier;
use offerflow::channels;
use offerflow::config::Settings;
use offerflow::ledger::Ledger;
use offerflow::logging::{self, ActivityLog};
use offerflow::orchestrator::Orchestrator;

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let activity_log = match ActivityLog::open(Settings::log_path()) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("could not open activity log {}: {e}", Settings::log_path());
            std::process::exit(1);
        }
    };
    logging::init(&activity_log);

    if let Err(e) = run().await {
        tracing::error!(error = %format!("{e:#}"), "fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let ledger = Ledger::open(Settings::db_path()).await?;
    ledger.init().await?;
    tracing::info!(path = %Settings::db_path(), "ledger initialized");

    // The error notifier has its own channel, independent of distribution.
    let settings = Settings::from_env();
    let alerts = match channels::build_error_channel(&settings) {
        Some(channel) => ErrorNotifier::new(channel),
        None => {
            tracing::info!("no error group configured, error alerts disabled");
            ErrorNotifier::disabled()
        }
    };

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    Orchestrator::new(ledger, alerts, cancel).run().await;
    tracing::info!("offerflow stopped");
    Ok(())
}
