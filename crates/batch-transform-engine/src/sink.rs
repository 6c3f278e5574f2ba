use batch_transform_core::{FailureRecord, SuccessRecord, TransformOutcome, WorkItem};
use parking_lot::Mutex;
use serde::Serialize;

/// Terminal outcomes of one pass, in recording order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultSet {
    pub succeeded: Vec<(WorkItem, SuccessRecord)>,
    pub failed: Vec<(WorkItem, FailureRecord)>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> PassStats {
        let original_bytes: u64 = self.succeeded.iter().map(|(_, s)| s.original_size).sum();
        let transformed_bytes: u64 = self.succeeded.iter().map(|(_, s)| s.artifact_size).sum();

        let percent_saved = if original_bytes == 0 {
            0.0
        } else {
            (1.0 - transformed_bytes as f64 / original_bytes as f64) * 100.0
        };

        PassStats {
            total_items: self.len(),
            succeeded: self.succeeded.len(),
            failed: self.failed.len(),
            original_bytes,
            transformed_bytes,
            percent_saved,
        }
    }

    /// Keys of failed items, in recording order
    pub fn failed_keys(&self) -> Vec<&str> {
        self.failed.iter().map(|(item, _)| item.key.as_str()).collect()
    }
}

/// Aggregate statistics over a finalized `ResultSet`.
///
/// Byte totals cover successful items only; `percent_saved` is 0 when
/// nothing succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassStats {
    pub total_items: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub transformed_bytes: u64,
    pub percent_saved: f64,
}

/// Shared, append-only collector that workers record outcomes into
#[derive(Default)]
pub struct ResultSink {
    results: Mutex<ResultSet>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, item: WorkItem, outcome: TransformOutcome) {
        let mut results = self.results.lock();
        match outcome {
            TransformOutcome::Success(record) => results.succeeded.push((item, record)),
            TransformOutcome::Failure(record) => results.failed.push((item, record)),
        }
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the accumulated results. Call once, after every worker has exited.
    pub fn finalize(&self) -> (ResultSet, PassStats) {
        let results = std::mem::take(&mut *self.results.lock());
        let stats = results.stats();
        (results, stats)
    }
}
