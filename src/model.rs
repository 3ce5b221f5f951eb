// src/model.rs
use serde::{Deserialize, Serialize};

/// A candidate promotional listing produced by a source adapter.
///
/// `link` is the canonical URL and the sole deduplication key: two deals
/// with the same link are the same listing, whatever the other fields say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub title: String,
    /// Raw, source-formatted price, e.g. "R$ 1.299,90" or "Ver no site".
    pub price: String,
    /// Pre-discount price; empty when the source shows no discount.
    #[serde(default)]
    pub original_price: String,
    /// Installment line as shown by the storefront, e.g. "10x de R$ 129,99".
    #[serde(default)]
    pub installment_text: String,
    /// Pix discount callout, e.g. "🔥 15% OFF".
    #[serde(default)]
    pub pix_discount_text: String,
    pub link: String,
    pub image_url: Option<String>,
}

/// Parse a Brazilian-formatted price string (e.g. "R$ 1.200,50") into a float.
///
/// Returns `None` when the cleaned string is empty or does not start with a
/// digit ("Ver no site" and friends), and on any numeric parse failure.
pub fn parse_price(price: &str) -> Option<f64> {
    let clean = price.trim().trim_start_matches("R$").trim();

    if !clean.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }

    // Thousands separator out, decimal comma to dot (BR format).
    let normalized = clean.replace('.', "").replace(',', ".");
    normalized.parse::<f64>().ok()
}
