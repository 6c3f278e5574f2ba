use crate::{
    sink::{PassStats, ResultSet},
    worker::{Worker, WorkerContext},
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// What a pool run produced
#[derive(Debug)]
pub struct PoolOutcome {
    pub results: ResultSet,
    pub stats: PassStats,
    pub workers_spawned: usize,
    /// Items left in the queue because the pass was cancelled
    pub unprocessed: usize,
}

/// Spawns workers over one queue and waits for all of them
pub struct WorkerPool {
    max_concurrent: usize,
}

impl WorkerPool {
    pub fn new(max_concurrent: usize) -> Self {
        WorkerPool {
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Workers a queue of `item_count` items gets
    pub fn worker_count(&self, item_count: usize) -> usize {
        item_count.min(self.max_concurrent)
    }

    /// Run the pass to completion.
    ///
    /// Spawns `min(queue length, max_concurrent)` workers as tokio tasks
    /// sharing `ctx`, then joins every one before finalizing the sink.
    pub async fn run(&self, ctx: WorkerContext) -> PoolOutcome {
        let ctx = Arc::new(ctx);
        let workers_spawned = self.worker_count(ctx.queue.len());

        debug!(
            "Spawning {} workers for {} items",
            workers_spawned,
            ctx.queue.len()
        );

        let mut workers = JoinSet::new();
        for id in 0..workers_spawned {
            workers.spawn(Worker::new(id, ctx.clone()).run());
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Worker task failed: {}", e);
            }
        }

        let unprocessed = ctx.queue.len();
        let (results, stats) = ctx.sink.finalize();

        PoolOutcome {
            results,
            stats,
            workers_spawned,
            unprocessed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{PassthroughAdapter, TransformAdapter};
    use crate::executor::TransformExecutor;
    use crate::paths::OutputPlacement;
    use crate::queue::WorkQueue;
    use crate::retry::RetryPolicy;
    use crate::sink::ResultSink;
    use async_trait::async_trait;
    use batch_transform_core::{MediaKind, TransformError, TransformedArtifact, WorkItem};
    use bytes::Bytes;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// Tracks how many transforms run at once
    struct GaugeAdapter {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TransformAdapter for GaugeAdapter {
        async fn transform(
            &self,
            bytes: Bytes,
            _kind: MediaKind,
            _timeout: Duration,
        ) -> Result<TransformedArtifact, TransformError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            let size = bytes.len() as u64;
            Ok(TransformedArtifact::new(bytes.slice(..bytes.len() / 2), size))
        }
    }

    fn seed(root: &Path, count: usize) -> Vec<WorkItem> {
        (0..count)
            .map(|i| {
                let path = root.join(format!("{}.png", i));
                std::fs::write(&path, vec![7u8; 64]).unwrap();
                WorkItem::from_path(root, &path).unwrap()
            })
            .collect()
    }

    fn context(
        root: &Path,
        out: &Path,
        items: Vec<WorkItem>,
        adapter: Arc<dyn TransformAdapter>,
    ) -> WorkerContext {
        WorkerContext {
            queue: Arc::new(WorkQueue::new(items)),
            sink: Arc::new(ResultSink::new()),
            executor: Arc::new(TransformExecutor::new(adapter, Duration::from_secs(5))),
            retry: RetryPolicy::new(0, Duration::ZERO),
            placement: OutputPlacement {
                source_root: root.to_path_buf(),
                output_root: out.to_path_buf(),
                preserve_structure: true,
            },
            inter_task_delay: Duration::ZERO,
            quarantine: None,
            cancel: CancellationToken::new(),
        }
    }

    #[test]
    fn test_worker_count() {
        let pool = WorkerPool::new(3);
        assert_eq!(pool.worker_count(2), 2);
        assert_eq!(pool.worker_count(3), 3);
        assert_eq!(pool.worker_count(10), 3);
        assert_eq!(pool.worker_count(0), 0);
        assert_eq!(WorkerPool::new(0).worker_count(5), 1);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let adapter = Arc::new(GaugeAdapter {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let ctx = context(src.path(), out.path(), seed(src.path(), 12), adapter.clone());

        let outcome = WorkerPool::new(3).run(ctx).await;

        assert_eq!(outcome.workers_spawned, 3);
        assert_eq!(outcome.stats.succeeded, 12);
        assert_eq!(outcome.unprocessed, 0);
        assert!(adapter.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(outcome.stats.original_bytes, 12 * 64);
        assert_eq!(outcome.stats.transformed_bytes, 12 * 32);
        assert!(out.path().join("0.png").exists());
    }

    #[tokio::test]
    async fn test_empty_queue_spawns_nothing() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ctx = context(src.path(), out.path(), Vec::new(), Arc::new(PassthroughAdapter));

        let outcome = WorkerPool::new(4).run(ctx).await;
        assert_eq!(outcome.workers_spawned, 0);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_pass_leaves_items_unprocessed() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let ctx = context(src.path(), out.path(), seed(src.path(), 5), Arc::new(PassthroughAdapter));
        ctx.cancel.cancel();

        let outcome = WorkerPool::new(2).run(ctx).await;
        assert_eq!(outcome.workers_spawned, 2);
        assert_eq!(outcome.unprocessed, 5);
        assert!(outcome.results.is_empty());
    }
}
