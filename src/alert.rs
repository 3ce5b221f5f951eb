// src/alert.rs
//! Best-effort error reporting to a dedicated ops channel, independent of
//! the listing-distribution channels. A failure to send the report itself is
//! swallowed; alerting must never take the loop down.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::channels::ChannelAdapter;

/// Error chain rendering is capped so a deep chain cannot blow past the
/// messaging platform's size limits.
const MAX_DETAIL_CHARS: usize = 3000;

#[derive(Clone)]
pub struct ErrorNotifier {
    channel: Option<Arc<dyn ChannelAdapter>>,
}

impl ErrorNotifier {
    pub fn new(channel: Arc<dyn ChannelAdapter>) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    /// Reporting is a no-op without a configured ops channel.
    pub fn disabled() -> Self {
        Self { channel: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    /// Render `(error, context)` into the ops-group message.
    pub fn format_report(error: &anyhow::Error, context: &str) -> String {
        let mut detail = String::new();
        for (i, cause) in error.chain().enumerate() {
            let _ = writeln!(detail, "{i}: {cause}");
        }
        if detail.chars().count() > MAX_DETAIL_CHARS {
            detail = detail.chars().take(MAX_DETAIL_CHARS).collect();
        }

        format!(
            "🚨 *ERRO NO OFFERFLOW* 🚨\n\n*Contexto:* {context}\n*Erro:* {error:#}\n\n*Detalhes:*\n```{detail}```"
        )
    }

    pub async fn report(&self, error: &anyhow::Error, context: &str) {
        let Some(channel) = &self.channel else {
            return;
        };

        let message = Self::format_report(error, context);
        if let Err(e) = channel.notify_text(&message).await {
            tracing::debug!(error = %e, context, "error report could not be delivered");
        }
    }
}
