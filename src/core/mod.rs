pub mod batch;
pub mod engine;
pub mod fetch;
pub mod ledger;
pub mod resume;
pub mod stats;

pub use crate::core::batch::BatchWriter;
pub use crate::core::engine::HarvestEngine;
pub use crate::core::fetch::Fetcher;
pub use crate::core::ledger::FailureLedger;
pub use crate::core::resume::ResumeState;
pub use crate::core::stats::SharedStats;
