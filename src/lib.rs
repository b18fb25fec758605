pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{CsvIdSource, ProductExtractor};
pub use config::HarvestConfig;
pub use crate::core::{engine::HarvestEngine, resume::ResumeState};
pub use utils::error::{HarvestError, Result};
