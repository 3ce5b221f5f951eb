// src/filter.rs
//! Drops deals already in the ledger, then applies the optional price floor.
//! Order-preserving.

use crate::ledger::Ledger;
use crate::model::{parse_price, Deal};

pub async fn filter_deals(ledger: &Ledger, deals: Vec<Deal>, min_price: f64) -> Vec<Deal> {
    let mut survivors = Vec::with_capacity(deals.len());

    for deal in deals {
        if ledger.exists(&deal.link).await {
            tracing::info!(title = %deal.title, "skipping already-posted deal");
            continue;
        }

        if min_price > 0.0 {
            // A price that fails to parse is not grounds for dropping the
            // deal; only a parsed value below the floor is.
            if let Some(value) = parse_price(&deal.price) {
                if value < min_price {
                    tracing::info!(
                        title = %deal.title,
                        price = value,
                        floor = min_price,
                        "skipping deal below the price floor"
                    );
                    continue;
                }
            }
        }

        survivors.push(deal);
    }

    survivors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(link: &str, price: &str) -> Deal {
        Deal {
            title: format!("deal {link}"),
            price: price.into(),
            original_price: String::new(),
            installment_text: String::new(),
            pix_discount_text: String::new(),
            link: link.into(),
            image_url: None,
        }
    }

    async fn fresh_ledger() -> Ledger {
        let ledger = Ledger::open_in_memory().await.unwrap();
        ledger.init().await.unwrap();
        ledger
    }

    #[tokio::test]
    async fn ledgered_deals_are_dropped_in_order() {
        let ledger = fresh_ledger().await;
        ledger.add("b", "seen before").await;

        let deals = vec![deal("a", "R$ 10,00"), deal("b", "R$ 20,00"), deal("c", "R$ 30,00")];
        let out = filter_deals(&ledger, deals, 0.0).await;
        let links: Vec<_> = out.iter().map(|d| d.link.as_str()).collect();
        assert_eq!(links, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn price_floor_drops_only_parsed_cheap_deals() {
        let ledger = fresh_ledger().await;
        let deals = vec![
            deal("cheap", "R$ 50,00"),
            deal("fine", "R$ 150,00"),
            deal("opaque", "Ver no site"),
        ];
        let out = filter_deals(&ledger, deals, 100.0).await;
        let links: Vec<_> = out.iter().map(|d| d.link.as_str()).collect();
        assert_eq!(links, vec!["fine", "opaque"]);
    }

    #[tokio::test]
    async fn zero_floor_disables_the_price_check() {
        let ledger = fresh_ledger().await;
        let out = filter_deals(&ledger, vec![deal("cheap", "R$ 0,50")], 0.0).await;
        assert_eq!(out.len(), 1);
    }
}
