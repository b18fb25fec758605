use crate::utils::validation::{
    validate_above, validate_path, validate_positive_number, validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "catalog-harvest")]
#[command(about = "Bulk-fetch catalog product records into resumable batch artifacts")]
pub struct HarvestConfig {
    /// Base URL of the catalog API; product ids are appended as path segments.
    #[arg(long, default_value = "https://api.tiki.vn/product-detail/api/v1/products")]
    pub api_base_url: String,

    /// CSV listing product ids, one per row, first column, with a header.
    #[arg(long, default_value = "./products.csv")]
    pub input_csv: String,

    #[arg(long, default_value = "./output")]
    pub output_dir: String,

    /// Number of concurrent fetch workers.
    #[arg(long, default_value = "50")]
    pub concurrency: usize,

    /// Attempts per identifier before it is recorded as failed.
    #[arg(long, default_value = "7")]
    pub max_retry: u32,

    /// Per-request timeout in seconds, independent of backoff timing.
    #[arg(long, default_value = "10")]
    pub timeout_secs: u64,

    /// Base multiplier for exponential backoff between retries.
    #[arg(long, default_value = "2.0")]
    pub base_backoff: f64,

    /// Successful records per batch artifact.
    #[arg(long, default_value = "1000")]
    pub batch_size: usize,

    /// Maximum ids pulled from the source per run.
    #[arg(long, default_value = "200000")]
    pub limit: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl HarvestConfig {
    pub fn ledger_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.output_dir).join("fail_ids.csv")
    }

    pub fn report_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.output_dir).join("stats_result.txt")
    }
}

impl Validate for HarvestConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        validate_url("api_base_url", &self.api_base_url)?;
        validate_path("input_csv", &self.input_csv)?;
        validate_path("output_dir", &self.output_dir)?;
        validate_positive_number("concurrency", self.concurrency, 1)?;
        validate_positive_number("max_retry", self.max_retry as usize, 1)?;
        validate_positive_number("timeout_secs", self.timeout_secs as usize, 1)?;
        validate_positive_number("batch_size", self.batch_size, 1)?;
        validate_positive_number("limit", self.limit, 1)?;
        validate_above("base_backoff", self.base_backoff, 1.0)?;
        Ok(())
    }
}
