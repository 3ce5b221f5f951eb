// src/sources/shopee.rs
//! Shopee affiliate GraphQL source. Requests are signed with
//! `SHA256(app_id + timestamp + payload + app_secret)`; keywords are
//! shuffled and each contributes at most one accepted product per cycle to
//! keep the batch varied.

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::time::Duration;

use super::SourceAdapter;
use crate::model::Deal;

const GRAPHQL_URL: &str = "https://open-api.affiliate.shopee.com.br/graphql";

const KEYWORDS: &[&str] = &[
    "smartphone",
    "smartwatch",
    "fone bluetooth",
    "notebook",
    "tablet",
    "monitor gamer",
    "teclado",
    "mouse gamer",
    "caixa de som",
    "alexa",
    "power bank",
    "câmera",
    "tv 4k",
    "playstation",
    "xbox",
    "nintendo",
    "cadeira gamer",
    "drone",
    "projetor",
    "soundbar",
    "air fryer",
    "robô aspirador",
    "cafeteira",
    "microondas",
    "ssd",
    "cartão de memória",
    "carregador",
    "cabo usb",
    "impressora",
    "ventilador",
    "furadeira",
    "parafusadeira",
    "smart tv",
    "geladeira",
    "lavadora",
    "iphone",
    "xiaomi",
    "headset",
    "kindle",
    "câmera de segurança",
    "roteador",
    "liquidificador",
    "panela elétrica",
];

pub struct ShopeeSource {
    app_id: String,
    app_secret: String,
    limit: usize,
    min_sales: u64,
    min_rating: f64,
    client: Client,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<ResponseData>,
    errors: Option<Value>,
}

#[derive(Deserialize)]
struct ResponseData {
    #[serde(rename = "productOfferV2")]
    product_offer: Option<OfferPage>,
}

#[derive(Deserialize)]
struct OfferPage {
    #[serde(default)]
    nodes: Vec<OfferNode>,
}

/// The API is loose about numeric types (strings and numbers both occur),
/// so the ambiguous fields come in as raw values and are coerced below.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferNode {
    product_name: Option<String>,
    price_min: Option<Value>,
    image_url: Option<String>,
    offer_link: Option<String>,
    sales: Option<Value>,
    rating_star: Option<Value>,
    price_discount_rate: Option<Value>,
}

fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u64(value: Option<&Value>) -> Option<u64> {
    as_f64(value).map(|v| v as u64)
}

/// `1234.5` → `"R$ 1.234,50"` (Brazilian grouping and decimal comma).
fn format_brl(value: f64) -> String {
    let cents = (value * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("R$ {grouped},{frac:02}")
}

impl ShopeeSource {
    pub fn new(
        app_id: String,
        app_secret: String,
        limit: usize,
        min_sales: u64,
        min_rating: f64,
    ) -> Self {
        Self {
            app_id,
            app_secret,
            limit,
            min_sales,
            min_rating,
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client"),
        }
    }

    /// SHA256(Credential + Timestamp + Payload + Secret), hex-encoded, per
    /// the affiliate API documentation.
    fn signature(&self, payload: &str, timestamp: i64) -> String {
        let factor = format!("{}{}{}{}", self.app_id, timestamp, payload, self.app_secret);
        format!("{:x}", Sha256::digest(factor.as_bytes()))
    }

    fn offer_query(keyword: &str, page: u32) -> String {
        format!(
            "{{ productOfferV2(page: {page}, limit: 20, keyword: \"{keyword}\") {{ \
             nodes {{ productName priceMin imageUrl offerLink commissionRate \
             sales ratingStar priceDiscountRate }} }} }}"
        )
    }

    async fn query_keyword(&self, keyword: &str, page: u32) -> Result<Vec<OfferNode>> {
        let query = Self::offer_query(keyword, page);
        // The signed payload must be byte-identical to the request body.
        let payload = serde_json::to_string(&serde_json::json!({ "query": query }))?;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = self.signature(&payload, timestamp);

        let response: GraphqlResponse = self
            .client
            .post(GRAPHQL_URL)
            .header("Content-Type", "application/json")
            .header(
                "Authorization",
                format!(
                    "SHA256 Credential={}, Timestamp={}, Signature={}",
                    self.app_id, timestamp, signature
                ),
            )
            .body(payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(errors) = response.errors {
            anyhow::bail!("shopee api errors: {errors}");
        }

        Ok(response
            .data
            .and_then(|d| d.product_offer)
            .map(|p| p.nodes)
            .unwrap_or_default())
    }

    /// Coerce one API node into a deal, applying the sales/rating floors.
    fn accept_node(&self, node: OfferNode, seen: &HashSet<String>) -> Option<Deal> {
        let link = node.offer_link.filter(|l| !l.is_empty())?;
        if seen.contains(&link) {
            tracing::debug!(link, "skipping duplicate shopee offer");
            return None;
        }

        let title = node.product_name.filter(|t| !t.is_empty())?;

        let sales = as_u64(node.sales.as_ref()).unwrap_or(0);
        if sales < self.min_sales {
            tracing::debug!(%title, sales, min = self.min_sales, "below sales floor");
            return None;
        }

        let rating = as_f64(node.rating_star.as_ref()).unwrap_or(0.0);
        if rating < self.min_rating {
            tracing::debug!(%title, rating, min = self.min_rating, "below rating floor");
            return None;
        }

        let price = match &node.price_min {
            None => "Ver no site".to_string(),
            Some(raw) => match as_f64(Some(raw)) {
                Some(v) => format_brl(v),
                None => format!("R$ {}", raw.as_str().unwrap_or_default()),
            },
        };

        let pix_discount_text = match as_u64(node.price_discount_rate.as_ref()) {
            Some(d) if d > 0 => format!("🔥 {d}% OFF"),
            _ => String::new(),
        };

        Some(Deal {
            title,
            price,
            original_price: String::new(),
            installment_text: String::new(),
            pix_discount_text,
            link,
            image_url: node.image_url,
        })
    }
}

#[async_trait]
impl SourceAdapter for ShopeeSource {
    async fn fetch(&self) -> Result<Vec<Deal>> {
        tracing::info!(url = GRAPHQL_URL, "querying Shopee affiliate API");

        let mut keywords: Vec<&str> = KEYWORDS.to_vec();
        keywords.shuffle(&mut rand::rng());

        let mut deals = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for keyword in keywords {
            if deals.len() >= self.limit {
                break;
            }

            // Vary the page so reruns surface products past the ones
            // already ledgered.
            let page = rand::rng().random_range(1..=5);
            tracing::debug!(keyword, page, "searching shopee keyword");

            let nodes = match self.query_keyword(keyword, page).await {
                Ok(nodes) => nodes,
                Err(e) => {
                    tracing::warn!(error = %e, keyword, "shopee keyword query failed");
                    continue;
                }
            };

            if nodes.is_empty() {
                tracing::debug!(keyword, "no shopee products for keyword");
                continue;
            }

            for node in nodes {
                if let Some(deal) = self.accept_node(node, &seen) {
                    tracing::info!(title = %deal.title, "shopee offer accepted");
                    seen.insert(deal.link.clone());
                    deals.push(deal);
                    // One product per keyword keeps categories varied.
                    break;
                }
            }
        }

        Ok(deals)
    }

    fn name(&self) -> &'static str {
        "Shopee"
    }
}
