// src/sources/mod.rs
//! Deal sources: each adapter extracts candidate listings from one
//! storefront. Adapters bound their own I/O; the collector isolates their
//! failures and guarantees `release_resources` runs after every fetch.

pub mod magazine_luiza;
pub mod mercado_livre;
pub mod shopee;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Settings;
use crate::model::Deal;

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch up to the configured limit of candidate deals.
    async fn fetch(&self) -> Result<Vec<Deal>>;

    /// Unconditional cleanup hook, called after every fetch attempt. Most
    /// HTTP-backed adapters have nothing to release.
    async fn release_resources(&self) {}

    fn name(&self) -> &'static str;
}

/// Instantiate the sources whose required settings are present, in a fixed
/// order. An empty result is handled by the orchestrator (logged error and a
/// short fallback sleep), not here.
pub fn build_sources(settings: &Settings) -> Vec<Box<dyn SourceAdapter>> {
    let mut sources: Vec<Box<dyn SourceAdapter>> = Vec::new();

    if let Some(url) = &settings.magazine_luiza_url {
        let limit = settings.source_limit(settings.magazine_luiza_limit);
        sources.push(Box::new(magazine_luiza::MagazineLuizaSource::new(
            url.clone(),
            limit,
        )));
    }

    if let Some(url) = &settings.mercado_livre_url {
        let limit = settings.source_limit(settings.mercado_livre_limit);
        sources.push(Box::new(mercado_livre::MercadoLivreSource::new(
            url.clone(),
            limit,
        )));
    }

    if let (Some(app_id), Some(app_secret)) = (&settings.shopee_app_id, &settings.shopee_app_secret)
    {
        let limit = settings.source_limit(settings.shopee_limit);
        sources.push(Box::new(shopee::ShopeeSource::new(
            app_id.clone(),
            app_secret.clone(),
            limit,
            settings.shopee_min_sales,
            settings.shopee_min_rating,
        )));
    }

    sources
}

pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
