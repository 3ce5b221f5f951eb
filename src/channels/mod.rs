// src/channels/mod.rs
//! Notification channels: each adapter knows how to deliver one deal to one
//! destination platform, plus a free-text path for operational alerts.

pub mod facebook;
pub mod instagram;
pub mod whatsapp;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Settings;
use crate::model::Deal;

#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Deliver one deal. Errors are isolated by the distributor.
    async fn post(&self, deal: &Deal) -> Result<()>;

    /// Send a plain operational message (error reports, status notes).
    async fn notify_text(&self, message: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Build the enabled channels for one cycle, honoring the `POST_TO_*`
/// toggles. A toggle without its required settings logs a warning and the
/// channel is skipped; zero channels is a valid (if pointless) outcome.
pub fn build_channels(settings: &Settings) -> Vec<Box<dyn ChannelAdapter>> {
    let mut channels: Vec<Box<dyn ChannelAdapter>> = Vec::new();

    if settings.post_to_whatsapp {
        match whatsapp::WhatsappChannel::from_settings(settings) {
            Some(ch) => channels.push(Box::new(ch)),
            None => tracing::warn!(
                "WhatsApp posting enabled but the Evolution API settings are incomplete"
            ),
        }
    }

    if settings.post_to_instagram {
        channels.push(Box::new(instagram::InstagramChannel::new()));
    }

    if settings.post_to_facebook {
        channels.push(Box::new(facebook::FacebookChannel::new()));
    }

    channels
}

/// Dedicated channel for error reports, pointed at the ops group chat.
/// `None` when the group id or the API credentials are missing.
pub fn build_error_channel(settings: &Settings) -> Option<Arc<dyn ChannelAdapter>> {
    let group_id = settings.whatsapp_error_group_id.clone()?;
    let evolution = settings.evolution.clone()?;
    Some(Arc::new(whatsapp::WhatsappChannel::new(evolution, group_id)))
}
