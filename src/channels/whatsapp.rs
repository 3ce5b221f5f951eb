// src/channels/whatsapp.rs
//! WhatsApp delivery through the Evolution API: `sendMedia` with the deal
//! message as caption when an image is available, `sendText` otherwise.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::ChannelAdapter;
use crate::config::{EvolutionApi, Settings};
use crate::model::Deal;

pub struct WhatsappChannel {
    api: EvolutionApi,
    chat_id: String,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct SendTextPayload<'a> {
    number: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct SendMediaPayload<'a> {
    number: &'a str,
    media: &'a str,
    mediatype: &'a str,
    caption: &'a str,
}

impl WhatsappChannel {
    pub fn new(api: EvolutionApi, chat_id: String) -> Self {
        Self {
            api,
            chat_id,
            client: Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Build from the cycle settings. `APP_ENV=test` redirects posts to
    /// `WHATSAPP_CHAT_ID_TEST` when one is configured.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let api = settings.evolution.clone()?;
        let mut chat_id = settings.whatsapp_chat_id.clone()?;

        if settings.app_env == "test" {
            match &settings.whatsapp_chat_id_test {
                Some(test_id) => {
                    tracing::info!(chat_id = %test_id, "test environment, redirecting WhatsApp posts");
                    chat_id = test_id.clone();
                }
                None => tracing::warn!(
                    "APP_ENV=test but WHATSAPP_CHAT_ID_TEST is unset, using production chat"
                ),
            }
        }

        Some(Self::new(api, chat_id))
    }

    fn endpoint(&self, operation: &str) -> String {
        format!(
            "{}/message/{operation}/{}",
            self.api.api_url, self.api.instance_name
        )
    }

    async fn send<P: Serialize>(&self, operation: &str, payload: &P) -> Result<()> {
        self.client
            .post(self.endpoint(operation))
            .header("apikey", &self.api.api_key)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("evolution api {operation} request"))?
            .error_for_status()
            .with_context(|| format!("evolution api {operation} status"))?;
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WhatsappChannel {
    async fn post(&self, deal: &Deal) -> Result<()> {
        let message = deal_message(deal);

        match &deal.image_url {
            Some(image) => {
                tracing::debug!(title = %deal.title, "sending deal with image");
                self.send(
                    "sendMedia",
                    &SendMediaPayload {
                        number: &self.chat_id,
                        media: image,
                        mediatype: "image",
                        caption: &message,
                    },
                )
                .await
            }
            None => {
                tracing::debug!(title = %deal.title, "sending text-only deal");
                self.send(
                    "sendText",
                    &SendTextPayload {
                        number: &self.chat_id,
                        text: &message,
                    },
                )
                .await
            }
        }
    }

    async fn notify_text(&self, message: &str) -> Result<()> {
        self.send(
            "sendText",
            &SendTextPayload {
                number: &self.chat_id,
                text: message,
            },
        )
        .await
    }

    fn name(&self) -> &'static str {
        "WhatsApp"
    }
}

/// WhatsApp message template: struck-through original price, installment
/// line, the price ("no Pix" for Magazine Luiza links), pix discount, and a
/// call-to-action with the link.
fn deal_message(deal: &Deal) -> String {
    let mut lines = vec![
        "🚨 *OFERTA DO DIA* 🚨\n".to_string(),
        deal.title.clone(),
        String::new(),
    ];

    if !deal.original_price.is_empty() {
        lines.push(format!("De ~{}~", deal.original_price));
    }

    if !deal.installment_text.is_empty() {
        lines.push(format!("Por apenas {}", deal.installment_text));
    }

    if deal.link.to_lowercase().contains("magazine") {
        lines.push(format!("{} no Pix", deal.price));
    } else {
        lines.push(deal.price.clone());
    }

    if !deal.pix_discount_text.is_empty() {
        lines.push(deal.pix_discount_text.clone());
    }

    lines.push(format!("\n👇 *Garanta o seu aqui:* \n{}", deal.link));
    lines.join("\n")
}
