// src/channels/instagram.rs
//! Simulation-mode Instagram channel: formats the caption a real Graph API
//! integration would publish and logs it instead of posting.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use super::ChannelAdapter;
use crate::model::Deal;

pub struct InstagramChannel;

impl InstagramChannel {
    pub fn new() -> Self {
        tracing::info!("Instagram channel initialized (simulation mode)");
        Self
    }

    fn caption(deal: &Deal) -> String {
        let mut lines = vec![
            "🚨 OFERTA IMPERDÍVEL 🚨".to_string(),
            format!("\n✨ {}\n", deal.title),
        ];

        if !deal.original_price.is_empty() {
            lines.push(format!("De ~{}~", deal.original_price));
        }

        lines.push(format!("Por apenas {}! 💰", deal.price));

        if !deal.installment_text.is_empty() {
            lines.push(format!("Ou em até {}", deal.installment_text));
        }

        // Feed captions have no clickable links.
        lines.push("\n🔗 Link da oferta nos stories ou na bio!".to_string());
        lines.push(format!("(Link real: {})", deal.link));
        lines.push("\n#oferta #promocao #desconto #achadinhos".to_string());
        lines.join("\n")
    }
}

impl Default for InstagramChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelAdapter for InstagramChannel {
    async fn post(&self, deal: &Deal) -> Result<()> {
        tracing::info!(title = %deal.title, "simulating Instagram post");
        tracing::debug!(caption = %Self::caption(deal), "instagram caption");
        // Stand in for the latency of a real API call.
        tokio::time::sleep(Duration::from_secs(1)).await;
        tracing::info!("Instagram post simulated successfully");
        Ok(())
    }

    async fn notify_text(&self, message: &str) -> Result<()> {
        tracing::info!(message, "simulating Instagram text notification");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Instagram"
    }
}
