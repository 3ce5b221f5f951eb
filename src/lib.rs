// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod alert;
pub mod channels;
pub mod collect;
pub mod config;
pub mod distribute;
pub mod filter;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod schedule;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::alert::ErrorNotifier;
pub use crate::ledger::Ledger;
pub use crate::model::{parse_price, Deal};
pub use crate::orchestrator::Orchestrator;
