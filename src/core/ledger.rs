use crate::domain::model::FailureRecord;
use crate::utils::error::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Append-only CSV of identifiers that terminated as NotFound or Failed.
/// Grows across runs and is never rewritten; the resume loader treats its
/// ids as completed.
pub struct FailureLedger {
    path: PathBuf,
}

impl FailureLedger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Appends the merged worker failure lists. The header row is written
    /// only when the file is new or empty.
    pub fn append(&self, records: &[FailureRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(["pid", "status/error"])?;
        }
        for record in records {
            writer.write_record([record.id.to_string(), record.status.clone()])?;
        }
        writer.flush()?;

        tracing::info!("Appended {} entries to {}", records.len(), self.path.display());
        Ok(())
    }
}
