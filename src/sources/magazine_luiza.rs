// src/sources/magazine_luiza.rs
//! Magazine Luiza product-card scraper, keyed off `data-testid` attributes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use super::{SourceAdapter, BROWSER_USER_AGENT};
use crate::model::Deal;

const BASE_URL: &str = "https://www.magazineluiza.com.br";

pub struct MagazineLuizaSource {
    url: String,
    limit: usize,
    client: Client,
}

impl MagazineLuizaSource {
    pub fn new(url: String, limit: usize) -> Self {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self { url, limit, client }
    }

    fn sel(css: &str) -> Selector {
        Selector::parse(css).expect("static selector")
    }

    fn text_of(card: ElementRef<'_>, css: &str) -> Option<String> {
        card.select(&Self::sel(css))
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    fn absolute_link(href: &str) -> String {
        if href.starts_with('/') {
            format!("{BASE_URL}{href}")
        } else {
            href.to_string()
        }
    }

    fn extract_card(card: ElementRef<'_>) -> Option<Deal> {
        let link = card.value().attr("href").map(Self::absolute_link)?;
        let title = Self::text_of(card, r#"[data-testid="product-title"]"#)?;
        let price = Self::text_of(card, r#"[data-testid="price-value"]"#)?;
        let original_price =
            Self::text_of(card, r#"[data-testid="price-original"]"#).unwrap_or_default();
        let installment_text =
            Self::text_of(card, r#"[data-testid="installment"]"#).unwrap_or_default();

        // No stable testid for the pix callout; match on the text itself.
        let pix_discount_text = card
            .select(&Self::sel("span"))
            .map(|s| s.text().collect::<String>().trim().to_string())
            .find(|t| t.contains("desconto no pix"))
            .unwrap_or_default();

        let image_url = card
            .select(&Self::sel(r#"img[data-testid="image"]"#))
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string);

        Some(Deal {
            title,
            price,
            original_price,
            installment_text,
            pix_discount_text,
            link,
            image_url,
        })
    }

    fn parse_page(&self, html: &str) -> Vec<Deal> {
        let document = Html::parse_document(html);
        let mut deals = Vec::new();

        for card in document.select(&Self::sel(r#"a[data-testid="product-card-container"]"#)) {
            if deals.len() >= self.limit {
                break;
            }
            match Self::extract_card(card) {
                Some(deal) => {
                    tracing::debug!(title = %deal.title, "collected product card");
                    deals.push(deal);
                }
                None => tracing::debug!("skipping product card with missing fields"),
            }
        }

        if deals.is_empty() {
            tracing::warn!("no product cards extracted, the page layout may have changed");
        }
        deals
    }
}

#[async_trait]
impl SourceAdapter for MagazineLuizaSource {
    async fn fetch(&self) -> Result<Vec<Deal>> {
        tracing::info!(url = %self.url, "fetching Magazine Luiza offers");
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("requesting magazine luiza page")?
            .error_for_status()
            .context("magazine luiza page status")?
            .text()
            .await
            .context("reading magazine luiza page body")?;

        Ok(self.parse_page(&body))
    }

    fn name(&self) -> &'static str {
        "MagazineLuiza"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD_HTML: &str = r#"
        <a data-testid="product-card-container" href="/smartphone-xyz/p/abc123/">
            <h2 data-testid="product-title">Smartphone XYZ 128GB</h2>
            <p data-testid="price-original">R$ 1.599,90</p>
            <p data-testid="price-value">R$ 1.299,90</p>
            <p data-testid="installment">10x de R$ 129,99</p>
            <span>5% de desconto no pix</span>
            <img data-testid="image" src="https://img.ml.com.br/xyz.jpg"/>
        </a>
        <a data-testid="product-card-container" href="https://www.magazineluiza.com.br/tv-50/p/def/">
            <h2 data-testid="product-title">Smart TV 50"</h2>
            <p data-testid="price-value">R$ 2.199,00</p>
        </a>
    "#;

    #[test]
    fn parses_testid_cards() {
        let source = MagazineLuizaSource::new("https://magalu.com/ofertas".into(), 3);
        let deals = source.parse_page(CARD_HTML);
        assert_eq!(deals.len(), 2);

        let first = &deals[0];
        assert_eq!(first.title, "Smartphone XYZ 128GB");
        assert_eq!(first.price, "R$ 1.299,90");
        assert_eq!(first.original_price, "R$ 1.599,90");
        assert_eq!(first.installment_text, "10x de R$ 129,99");
        assert_eq!(first.pix_discount_text, "5% de desconto no pix");
        assert_eq!(
            first.link,
            "https://www.magazineluiza.com.br/smartphone-xyz/p/abc123/"
        );

        let second = &deals[1];
        assert_eq!(second.pix_discount_text, "");
        assert_eq!(second.link, "https://www.magazineluiza.com.br/tv-50/p/def/");
    }
}
