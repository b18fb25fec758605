pub mod model;
pub mod ports;

pub use crate::domain::model::{
    BatchInfo, FailureRecord, FetchOutcome, Product, ProductId, StatsSnapshot,
};
pub use crate::domain::ports::{Extractor, IdSource};
