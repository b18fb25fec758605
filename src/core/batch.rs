use crate::core::resume::artifact_path;
use crate::core::stats::SharedStats;
use crate::domain::model::{BatchInfo, Product};
use crate::utils::error::Result;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc;

/// Single consumer of the result channel. Collects successful records
/// into a buffer, seals a full buffer to `products_{index:03}.json`, and
/// flushes the trailing partial buffer when the channel closes.
pub struct BatchWriter {
    output_dir: PathBuf,
    batch_size: usize,
    index: u32,
    buffer: Vec<Product>,
    /// Records appended during this run. Starts at zero even when the
    /// buffer was reopened from a partial artifact.
    newly_added: usize,
    batch_started: Instant,
    stats: SharedStats,
}

impl BatchWriter {
    pub fn new(
        output_dir: PathBuf,
        batch_size: usize,
        initial_index: u32,
        initial_buffer: Vec<Product>,
        stats: SharedStats,
    ) -> Self {
        if !initial_buffer.is_empty() {
            tracing::info!(
                "Resuming batch {:03} with {}/{} records",
                initial_index,
                initial_buffer.len(),
                batch_size
            );
        }
        Self {
            output_dir,
            batch_size,
            index: initial_index,
            buffer: initial_buffer,
            newly_added: 0,
            batch_started: Instant::now(),
            stats,
        }
    }

    /// Drains the result channel until every producer has dropped its
    /// sender, which happens strictly after all workers pushed their last
    /// outcome. No buffered success can be lost to an early exit.
    pub async fn drain(mut self, mut results: mpsc::Receiver<Product>) -> Result<()> {
        while let Some(product) = results.recv().await {
            self.push(product)?;
        }
        self.flush_partial()
    }

    fn push(&mut self, product: Product) -> Result<()> {
        self.buffer.push(product);
        self.newly_added += 1;
        if self.buffer.len() >= self.batch_size {
            self.seal()?;
        }
        Ok(())
    }

    /// Writes the full buffer as a sealed artifact and opens the next
    /// index. Sealed artifacts are immutable from here on.
    fn seal(&mut self) -> Result<()> {
        let path = artifact_path(&self.output_dir, self.index);
        std::fs::write(&path, serde_json::to_vec_pretty(&self.buffer)?)?;

        let elapsed = self.batch_started.elapsed();
        self.stats.add_ok(self.newly_added as u64);
        self.stats.record_batch(BatchInfo {
            index: self.index,
            count: self.buffer.len(),
            newly_added: self.newly_added,
            elapsed,
        });
        tracing::info!(
            "Sealed batch {:03} ({} records, {:.2}s) -> {}",
            self.index,
            self.buffer.len(),
            elapsed.as_secs_f64(),
            path.display()
        );

        self.buffer.clear();
        self.newly_added = 0;
        self.index += 1;
        self.batch_started = Instant::now();
        Ok(())
    }

    /// Flushes a non-empty trailing buffer as a partial artifact at the
    /// current index, overwriting a previously reopened partial file.
    /// This is the only artifact ever rewritten during a run.
    fn flush_partial(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let path = artifact_path(&self.output_dir, self.index);
        std::fs::write(&path, serde_json::to_vec_pretty(&self.buffer)?)?;

        let elapsed = self.batch_started.elapsed();
        self.stats.add_ok(self.newly_added as u64);
        self.stats.record_batch(BatchInfo {
            index: self.index,
            count: self.buffer.len(),
            newly_added: self.newly_added,
            elapsed,
        });
        tracing::info!(
            "Flushed partial batch {:03} ({} records, {} new this run) -> {}",
            self.index,
            self.buffer.len(),
            self.newly_added,
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ProductId;
    use tempfile::TempDir;

    fn product(id: ProductId) -> Product {
        Product {
            id,
            name: Some(format!("Product {}", id)),
            url_key: None,
            price: None,
            description: String::new(),
            images_url: vec![],
        }
    }

    fn read_artifact(dir: &std::path::Path, index: u32) -> Vec<Product> {
        let contents = std::fs::read_to_string(artifact_path(dir, index)).unwrap();
        serde_json::from_str(&contents).unwrap()
    }

    #[tokio::test]
    async fn test_seals_full_batches_and_flushes_partial() {
        let dir = TempDir::new().unwrap();
        let stats = SharedStats::new(0, 3);
        let writer = BatchWriter::new(dir.path().to_path_buf(), 2, 1, Vec::new(), stats.clone());

        let (tx, rx) = mpsc::channel(8);
        for id in [10, 20, 30] {
            tx.send(product(id)).await.unwrap();
        }
        drop(tx);
        writer.drain(rx).await.unwrap();

        let sealed = read_artifact(dir.path(), 1);
        assert_eq!(sealed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![10, 20]);
        let partial = read_artifact(dir.path(), 2);
        assert_eq!(partial.len(), 1);
        assert_eq!(partial[0].id, 30);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.ok, 3);
        assert_eq!(snapshot.batches.len(), 2);
        assert_eq!(snapshot.batches[0].count, 2);
        assert_eq!(snapshot.batches[1].count, 1);
    }

    #[tokio::test]
    async fn test_reopened_buffer_seals_at_same_index() {
        let dir = TempDir::new().unwrap();
        let stats = SharedStats::new(1, 1);
        let writer = BatchWriter::new(
            dir.path().to_path_buf(),
            2,
            1,
            vec![product(1)],
            stats.clone(),
        );

        let (tx, rx) = mpsc::channel(8);
        tx.send(product(2)).await.unwrap();
        drop(tx);
        writer.drain(rx).await.unwrap();

        let sealed = read_artifact(dir.path(), 1);
        assert_eq!(sealed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);

        // Only the record appended this run counts toward ok.
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.ok, 1);
        assert_eq!(snapshot.batches[0].count, 2);
        assert_eq!(snapshot.batches[0].newly_added, 1);
    }

    #[tokio::test]
    async fn test_empty_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let stats = SharedStats::new(0, 0);
        let writer = BatchWriter::new(dir.path().to_path_buf(), 2, 1, Vec::new(), stats.clone());

        let (tx, rx) = mpsc::channel::<Product>(1);
        drop(tx);
        writer.drain(rx).await.unwrap();

        assert!(!artifact_path(dir.path(), 1).exists());
        assert_eq!(stats.snapshot().ok, 0);
    }
}
