use crate::domain::model::{BatchInfo, StatsSnapshot};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Run counters and batch metadata shared between the workers and the
/// batch writer. One lock, short critical sections, no I/O while held.
#[derive(Debug, Clone, Default)]
pub struct SharedStats {
    inner: Arc<Mutex<StatsSnapshot>>,
}

impl SharedStats {
    pub fn new(completed_on_start: usize, scheduled: usize) -> Self {
        let stats = SharedStats::default();
        {
            let mut inner = stats.inner.lock().unwrap();
            inner.completed_on_start = completed_on_start;
            inner.scheduled = scheduled;
        }
        stats
    }

    pub fn add_ok(&self, count: u64) {
        self.inner.lock().unwrap().ok += count;
    }

    pub fn add_not_found(&self, count: u64) {
        self.inner.lock().unwrap().not_found += count;
    }

    /// Incremented per permanent failure while the pool is still running,
    /// so the live count stays accurate. NotFound is tallied worker-local
    /// and merged after the pool joins.
    pub fn record_failure(&self) {
        self.inner.lock().unwrap().failed += 1;
    }

    pub fn record_batch(&self, info: BatchInfo) {
        self.inner.lock().unwrap().batches.push(info);
    }

    pub fn set_total_elapsed(&self, elapsed: Duration) {
        self.inner.lock().unwrap().total_elapsed = elapsed;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().unwrap().clone()
    }
}
