use crate::domain::model::{Product, ProductId};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Starting state for a run, reconstructed purely from the artifacts and
/// the failure ledger already on disk. Nothing is mutated during loading.
#[derive(Debug, Clone)]
pub struct ResumeState {
    /// Ids with a terminal outcome from earlier runs. Never re-enqueued.
    pub completed: HashSet<ProductId>,
    /// Index the batch writer starts at.
    pub next_index: u32,
    /// Contents of a reopened partial artifact at `next_index`, empty for
    /// a fresh batch. Its ids stay in `completed` (they are never
    /// re-fetched); the records themselves survive through this buffer
    /// and are re-sealed with it.
    pub buffer: Vec<Product>,
}

pub fn artifact_path(output_dir: &Path, index: u32) -> PathBuf {
    output_dir.join(format!("products_{:03}.json", index))
}

impl ResumeState {
    /// True when no prior artifacts existed, i.e. this run starts from
    /// scratch rather than resuming.
    pub fn is_fresh(&self) -> bool {
        self.next_index == 1 && self.buffer.is_empty() && self.completed.is_empty()
    }

    pub fn load(output_dir: &Path, ledger_path: &Path, batch_size: usize) -> Self {
        let mut completed = HashSet::new();
        let mut max_index: u32 = 0;
        let mut max_contents: Option<Vec<Product>> = None;

        for (index, path) in scan_artifacts(output_dir) {
            let contents = match read_artifact(&path) {
                Ok(products) => products,
                Err(e) => {
                    tracing::warn!("Skipping unreadable artifact {}: {}", path.display(), e);
                    if index > max_index {
                        max_index = index;
                        max_contents = None;
                    }
                    continue;
                }
            };

            for product in &contents {
                completed.insert(product.id);
            }

            if index > max_index {
                max_index = index;
                max_contents = Some(contents);
            }
        }

        let (next_index, buffer) = match max_contents {
            // Short trailing artifact: reopen it as the active buffer and
            // reseal at the same index later.
            Some(contents) if max_index > 0 && contents.len() < batch_size => {
                (max_index, contents)
            }
            Some(_) => (max_index + 1, Vec::new()),
            // No artifacts, or the trailing one was unreadable. A corrupt
            // trailing file is left in place and never rewritten.
            None if max_index > 0 => (max_index + 1, Vec::new()),
            None => (1, Vec::new()),
        };

        for id in read_ledger_ids(ledger_path) {
            completed.insert(id);
        }

        ResumeState {
            completed,
            next_index,
            buffer,
        }
    }
}

fn scan_artifacts(output_dir: &Path) -> Vec<(u32, PathBuf)> {
    let entries = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut artifacts = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        let index_str = match name
            .strip_prefix("products_")
            .and_then(|rest| rest.strip_suffix(".json"))
        {
            Some(index_str) => index_str,
            None => continue,
        };
        match index_str.parse::<u32>() {
            Ok(index) => artifacts.push((index, path)),
            Err(_) => continue,
        }
    }
    artifacts
}

fn read_artifact(path: &Path) -> std::io::Result<Vec<Product>> {
    let file = File::open(path)?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(std::io::Error::from)
}

fn read_ledger_ids(ledger_path: &Path) -> Vec<ProductId> {
    if !ledger_path.exists() {
        return Vec::new();
    }

    let mut reader = match csv::Reader::from_path(ledger_path) {
        Ok(reader) => reader,
        Err(e) => {
            tracing::warn!(
                "Skipping unreadable failure ledger {}: {}",
                ledger_path.display(),
                e
            );
            return Vec::new();
        }
    };

    let mut ids = Vec::new();
    for record in reader.records().flatten() {
        if let Some(id) = record.get(0).and_then(|field| field.parse::<u64>().ok()) {
            ids.push(id);
        }
    }
    ids
}
