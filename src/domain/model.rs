use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type ProductId = u64;

/// Extracted record shape persisted into batch artifacts. The engine only
/// reads `id`; everything else belongs to the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: Option<String>,
    pub url_key: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images_url: Vec<String>,
}

/// Terminal outcome of the per-identifier fetch state machine.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(Product),
    NotFound,
    /// Retry budget exhausted; carries the last observed error kind,
    /// already formatted for the ledger (`FAIL (<kind>)`).
    Failed(String),
}

/// One row of the failure ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub id: ProductId,
    pub status: String,
}

impl FailureRecord {
    pub fn not_found(id: ProductId) -> Self {
        Self {
            id,
            status: "404".to_string(),
        }
    }

    pub fn failed(id: ProductId, status: String) -> Self {
        Self { id, status }
    }
}

/// Metadata recorded when a batch is sealed or flushed.
#[derive(Debug, Clone)]
pub struct BatchInfo {
    pub index: u32,
    pub count: usize,
    /// Records appended during this run, tracked at append time. Differs
    /// from `count` only for a reopened partial batch.
    pub newly_added: usize,
    pub elapsed: Duration,
}

/// Immutable snapshot of the run statistics, handed to the reporter.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    pub ok: u64,
    pub not_found: u64,
    pub failed: u64,
    pub completed_on_start: usize,
    pub scheduled: usize,
    pub batches: Vec<BatchInfo>,
    pub total_elapsed: Duration,
}
