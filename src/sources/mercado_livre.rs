// src/sources/mercado_livre.rs
//! Mercado Livre daily-offers page scraper.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use super::{SourceAdapter, BROWSER_USER_AGENT};
use crate::model::Deal;

pub struct MercadoLivreSource {
    url: String,
    limit: usize,
    client: Client,
}

impl MercadoLivreSource {
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

    fn extract_card(card: ElementRef<'_>) -> Option<Deal> {
        let link = card
            .select(&Self::sel("a.promotion-item__link-container"))
            .next()
            .and_then(|a| a.value().attr("href"))?
            .to_string();

        let title = card
            .select(&Self::sel("p.promotion-item__title"))
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())?;

        let price = card
            .select(&Self::sel(
                "div.andes-money-amount-combo__main-container span.andes-money-amount__fraction",
            ))
            .next()
            .map(|p| format!("R$ {}", p.text().collect::<String>().trim()))
            .unwrap_or_else(|| "Preço não encontrado".to_string());

        let original_price = card
            .select(&Self::sel(
                "s.andes-money-amount-combo__previous-value span.andes-money-amount__fraction",
            ))
            .next()
            .map(|p| format!("R$ {}", p.text().collect::<String>().trim()))
            .unwrap_or_default();

        let image_url = card
            .select(&Self::sel("img.promotion-item__img"))
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string);

        Some(Deal {
            title,
            price,
            original_price,
            // Installments and pix discounts are not shown on the offer cards.
            installment_text: String::new(),
            pix_discount_text: String::new(),
            link,
            image_url,
        })
    }

    fn parse_page(&self, html: &str) -> Vec<Deal> {
        let document = Html::parse_document(html);
        let cards: Vec<_> = document
            .select(&Self::sel("div.promotion-item__container"))
            .collect();

        if cards.is_empty() {
            tracing::warn!("no offer cards matched the selector, the page layout may have changed");
        }

        let mut deals = Vec::new();
        for card in cards {
            if deals.len() >= self.limit {
                break;
            }
            match Self::extract_card(card) {
                Some(deal) => {
                    tracing::debug!(title = %deal.title, "collected offer card");
                    deals.push(deal);
                }
                None => tracing::debug!("skipping offer card with missing fields"),
            }
        }
        deals
    }
}

#[async_trait]
impl SourceAdapter for MercadoLivreSource {
    async fn fetch(&self) -> Result<Vec<Deal>> {
        tracing::info!(url = %self.url, "fetching Mercado Livre offers");
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("requesting mercado livre offers page")?
            .error_for_status()
            .context("mercado livre offers page status")?
            .text()
            .await
            .context("reading mercado livre offers page body")?;

        Ok(self.parse_page(&body))
    }

    fn name(&self) -> &'static str {
        "MercadoLivre"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD_HTML: &str = r#"
        <div class="promotion-item__container">
            <a class="promotion-item__link-container" href="https://ml.com/oferta-1"></a>
            <p class="promotion-item__title"> Notebook Gamer 16GB </p>
            <div class="andes-money-amount-combo__main-container">
                <span class="andes-money-amount__fraction">3.499</span>
            </div>
            <s class="andes-money-amount-combo__previous-value">
                <span class="andes-money-amount__fraction">4.299</span>
            </s>
            <img class="promotion-item__img" src="https://ml.com/img1.jpg"/>
        </div>
        <div class="promotion-item__container">
            <a class="promotion-item__link-container" href="https://ml.com/oferta-2"></a>
            <p class="promotion-item__title">Mouse sem fio</p>
            <div class="andes-money-amount-combo__main-container">
                <span class="andes-money-amount__fraction">89</span>
            </div>
        </div>
        <div class="promotion-item__container">
            <p class="promotion-item__title">Card sem link, deve ser pulado</p>
        </div>
    "#;

    #[test]
    fn parses_cards_and_tolerates_missing_fields() {
        let source = MercadoLivreSource::new("https://ml.com/ofertas".into(), 10);
        let deals = source.parse_page(CARD_HTML);
        assert_eq!(deals.len(), 2);

        assert_eq!(deals[0].title, "Notebook Gamer 16GB");
        assert_eq!(deals[0].price, "R$ 3.499");
        assert_eq!(deals[0].original_price, "R$ 4.299");
        assert_eq!(deals[0].link, "https://ml.com/oferta-1");
        assert_eq!(deals[0].image_url.as_deref(), Some("https://ml.com/img1.jpg"));

        assert_eq!(deals[1].title, "Mouse sem fio");
        assert_eq!(deals[1].original_price, "");
        assert_eq!(deals[1].image_url, None);
    }

    #[test]
    fn limit_caps_collected_cards() {
        let source = MercadoLivreSource::new("https://ml.com/ofertas".into(), 1);
        let deals = source.parse_page(CARD_HTML);
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].link, "https://ml.com/oferta-1");
    }
}
