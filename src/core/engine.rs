use crate::config::HarvestConfig;
use crate::core::batch::BatchWriter;
use crate::core::fetch::{pacing_delay, Fetcher};
use crate::core::ledger::FailureLedger;
use crate::core::resume::ResumeState;
use crate::core::stats::SharedStats;
use crate::domain::model::{FailureRecord, FetchOutcome, Product, ProductId, StatsSnapshot};
use crate::domain::ports::{Extractor, IdSource};
use crate::utils::error::{HarvestError, Result};
use crate::utils::report;
use reqwest::Client;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/100.0.4896.127 Safari/537.36";

/// Per-worker tally, merged into the shared stats only after the pool
/// joins so the hot path never contends on the stats lock.
#[derive(Debug, Default)]
struct WorkerTally {
    ok: u64,
    not_found: u64,
    failures: Vec<FailureRecord>,
}

/// Orchestrates one harvest run: resume-state reconstruction, the fetch
/// worker pool, the batch writer, the failure ledger, and the report.
pub struct HarvestEngine<S, E> {
    config: HarvestConfig,
    id_source: S,
    extractor: Arc<E>,
}

impl<S, E> HarvestEngine<S, E>
where
    S: IdSource,
    E: Extractor + 'static,
{
    pub fn new(config: HarvestConfig, id_source: S, extractor: E) -> Self {
        Self {
            config,
            id_source,
            extractor: Arc::new(extractor),
        }
    }

    pub async fn run(&self) -> Result<StatsSnapshot> {
        let started = Instant::now();
        let output_dir = Path::new(&self.config.output_dir);
        std::fs::create_dir_all(output_dir)?;

        let resume = ResumeState::load(
            output_dir,
            &self.config.ledger_path(),
            self.config.batch_size,
        );
        let resumed = !resume.is_fresh();
        let completed_on_start = resume.completed.len();
        tracing::info!(
            "{} identifiers already completed, next batch index {:03}",
            completed_on_start,
            resume.next_index
        );

        // The completed count doubles as the source cursor: every finished
        // id corresponds to one consumed source row.
        let ids = self
            .id_source
            .load(completed_on_start, self.config.limit)
            .await?;
        if ids.is_empty() {
            tracing::info!("ID source exhausted at offset {}, nothing to do", completed_on_start);
            return Ok(self.empty_snapshot(completed_on_start, started));
        }

        let pending: Vec<ProductId> = ids
            .into_iter()
            .filter(|id| !resume.completed.contains(id))
            .collect();
        if pending.is_empty() {
            tracing::info!("Every id in the current block is already processed");
            return Ok(self.empty_snapshot(completed_on_start, started));
        }

        tracing::info!(
            "Fetching {} ids with {} workers (batch size {})",
            pending.len(),
            self.config.concurrency,
            self.config.batch_size
        );

        let stats = SharedStats::new(completed_on_start, pending.len());
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .pool_max_idle_per_host(self.config.concurrency * 2)
            .user_agent(USER_AGENT)
            .build()?;
        let fetcher = Arc::new(Fetcher::new(
            client,
            self.config.api_base_url.clone(),
            self.config.max_retry,
            self.config.base_backoff,
            Arc::clone(&self.extractor),
        ));

        // Work queue: preloaded, then the sender is dropped so an empty
        // queue reads as shutdown. Replaces per-worker poison pills.
        let (work_tx, work_rx) = mpsc::unbounded_channel();
        for id in pending {
            work_tx
                .send(id)
                .map_err(|_| HarvestError::ProcessingError {
                    message: "work queue closed before it was filled".to_string(),
                })?;
        }
        drop(work_tx);
        let work_rx = Arc::new(Mutex::new(work_rx));

        // Bounded result queue: full buffer backpressures the workers.
        let (result_tx, result_rx) = mpsc::channel(self.config.concurrency * 2);

        let writer = BatchWriter::new(
            output_dir.to_path_buf(),
            self.config.batch_size,
            resume.next_index,
            resume.buffer,
            stats.clone(),
        );
        let writer_task = tokio::spawn(writer.drain(result_rx));

        let mut workers = Vec::with_capacity(self.config.concurrency);
        for _ in 0..self.config.concurrency {
            workers.push(tokio::spawn(worker_loop(
                Arc::clone(&fetcher),
                Arc::clone(&work_rx),
                result_tx.clone(),
                stats.clone(),
            )));
        }
        // Workers hold the only result senders; the channel closes once
        // the last worker has pushed its last outcome.
        drop(result_tx);

        let mut failures = Vec::new();
        let mut fetched_ok: u64 = 0;
        for worker in workers {
            let tally = worker.await.map_err(|e| HarvestError::ProcessingError {
                message: format!("worker task panicked: {}", e),
            })?;
            fetched_ok += tally.ok;
            stats.add_not_found(tally.not_found);
            failures.extend(tally.failures);
        }
        tracing::debug!(
            "Worker pool drained: {} fetched ok, {} terminal failures",
            fetched_ok,
            failures.len()
        );

        FailureLedger::new(self.config.ledger_path()).append(&failures)?;

        writer_task
            .await
            .map_err(|e| HarvestError::ProcessingError {
                message: format!("batch writer task panicked: {}", e),
            })??;

        stats.set_total_elapsed(started.elapsed());
        let snapshot = stats.snapshot();
        self.write_report(&snapshot, resumed)?;
        Ok(snapshot)
    }

    fn empty_snapshot(&self, completed_on_start: usize, started: Instant) -> StatsSnapshot {
        let stats = SharedStats::new(completed_on_start, 0);
        stats.set_total_elapsed(started.elapsed());
        stats.snapshot()
    }

    fn write_report(&self, snapshot: &StatsSnapshot, resumed: bool) -> Result<()> {
        let contents = report::format_report(snapshot, resumed);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(resumed)
            .truncate(!resumed)
            .open(self.config.report_path())?;
        file.write_all(contents.as_bytes())?;
        tracing::info!("Report saved to {}", self.config.report_path().display());
        Ok(())
    }
}

async fn worker_loop<E: Extractor>(
    fetcher: Arc<Fetcher<E>>,
    work: Arc<Mutex<mpsc::UnboundedReceiver<ProductId>>>,
    results: mpsc::Sender<Product>,
    stats: SharedStats,
) -> WorkerTally {
    let mut tally = WorkerTally::default();

    loop {
        let id = {
            let mut queue = work.lock().await;
            queue.recv().await
        };
        let Some(id) = id else {
            break;
        };

        tokio::time::sleep(pacing_delay()).await;

        match fetcher.fetch(id).await {
            FetchOutcome::Success(product) => {
                tally.ok += 1;
                if results.send(product).await.is_err() {
                    // Writer is gone; nothing downstream can persist
                    // further successes.
                    tracing::warn!("Result queue closed, worker stopping");
                    break;
                }
            }
            FetchOutcome::NotFound => {
                tally.not_found += 1;
                tally.failures.push(FailureRecord::not_found(id));
            }
            FetchOutcome::Failed(status) => {
                tally.failures.push(FailureRecord::failed(id, status));
                stats.record_failure();
            }
        }
    }

    tally
}
