// src/channels/facebook.rs
//! Simulation-mode Facebook page channel, mirroring the Instagram one but
//! with an inline link (page posts allow them).

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use super::ChannelAdapter;
use crate::model::Deal;

pub struct FacebookChannel;

impl FacebookChannel {
    pub fn new() -> Self {
        tracing::info!("Facebook channel initialized (simulation mode)");
        Self
    }

    fn post_text(deal: &Deal) -> String {
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

        lines.push("\n👇 Garanta a sua no link abaixo:".to_string());
        lines.push(deal.link.clone());
        lines.push("\n#oferta #promocao #desconto #achadinhos".to_string());
        lines.join("\n")
    }
}

impl Default for FacebookChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelAdapter for FacebookChannel {
    async fn post(&self, deal: &Deal) -> Result<()> {
        tracing::info!(title = %deal.title, "simulating Facebook post");
        tracing::debug!(text = %Self::post_text(deal), "facebook post text");
        tokio::time::sleep(Duration::from_secs(1)).await;
        tracing::info!("Facebook post simulated successfully");
        Ok(())
    }

    async fn notify_text(&self, message: &str) -> Result<()> {
        tracing::info!(message, "simulating Facebook text notification");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Facebook"
    }
}
