// tests/collector_isolation.rs
// A broken source must not abort the cycle, and resource cleanup must run
// whether the fetch succeeded or not.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use offerflow::collect::collect;
use offerflow::sources::SourceAdapter;
use offerflow::{Deal, ErrorNotifier};

fn deal(link: &str) -> Deal {
    Deal {
        title: format!("deal {link}"),
        price: "R$ 10,00".into(),
        original_price: String::new(),
        installment_text: String::new(),
        pix_discount_text: String::new(),
        link: link.into(),
        image_url: None,
    }
}

struct TestSource {
    name: &'static str,
    deals: Vec<Deal>,
    fail: bool,
    released: Arc<AtomicBool>,
}

#[async_trait]
impl SourceAdapter for TestSource {
    async fn fetch(&self) -> anyhow::Result<Vec<Deal>> {
        if self.fail {
            anyhow::bail!("storefront returned garbage");
        }
        Ok(self.deals.clone())
    }

    async fn release_resources(&self) {
        self.released.store(true, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[tokio::test]
async fn failing_source_is_isolated_and_everyone_is_released() {
    let released: Vec<Arc<AtomicBool>> = (0..3).map(|_| Arc::default()).collect();

    let sources: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(TestSource {
            name: "First",
            deals: vec![deal("a"), deal("b")],
            fail: false,
            released: Arc::clone(&released[0]),
        }),
        Box::new(TestSource {
            name: "Broken",
            deals: vec![],
            fail: true,
            released: Arc::clone(&released[1]),
        }),
        Box::new(TestSource {
            name: "Last",
            deals: vec![deal("c")],
            fail: false,
            released: Arc::clone(&released[2]),
        }),
    ];

    let collected = collect(&sources, &ErrorNotifier::disabled()).await;

    // Adapter order and each adapter's internal order are preserved.
    let links: Vec<_> = collected.iter().map(|d| d.link.as_str()).collect();
    assert_eq!(links, vec!["a", "b", "c"]);

    for flag in &released {
        assert!(flag.load(Ordering::SeqCst), "release_resources not called");
    }
}

#[tokio::test]
async fn all_sources_failing_yields_an_empty_batch() {
    let sources: Vec<Box<dyn SourceAdapter>> = vec![Box::new(TestSource {
        name: "Broken",
        deals: vec![],
        fail: true,
        released: Arc::default(),
    })];

    let collected = collect(&sources, &ErrorNotifier::disabled()).await;
    assert!(collected.is_empty());
}
