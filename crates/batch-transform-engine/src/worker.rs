use crate::{
    executor::TransformExecutor, paths::OutputPlacement, quarantine::QuarantineManager,
    queue::WorkQueue, retry::RetryPolicy, sink::ResultSink,
};
use batch_transform_core::{
    FailureRecord, SuccessRecord, TransformError, TransformOutcome, TransformedArtifact, WorkItem,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Everything the workers of one pass share
pub struct WorkerContext {
    pub queue: Arc<WorkQueue>,
    pub sink: Arc<ResultSink>,
    pub executor: Arc<TransformExecutor>,
    pub retry: RetryPolicy,
    pub placement: OutputPlacement,
    pub inter_task_delay: Duration,
    /// Set on recovery passes: successes drop their held copy
    pub quarantine: Option<Arc<QuarantineManager>>,
    pub cancel: CancellationToken,
}

/// One logical worker draining the shared queue
pub struct Worker {
    id: usize,
    ctx: Arc<WorkerContext>,
}

impl Worker {
    pub fn new(id: usize, ctx: Arc<WorkerContext>) -> Self {
        Worker { id, ctx }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Process items until the queue is empty or the pass is cancelled.
    ///
    /// Returns the number of items this worker recorded. Cancellation is
    /// only observed between items, so an item in flight always gets its
    /// outcome recorded.
    pub async fn run(self) -> usize {
        let mut processed = 0;

        loop {
            if self.ctx.cancel.is_cancelled() {
                debug!("Worker {} stopping on cancellation", self.id);
                break;
            }

            let Some(item) = self.ctx.queue.dequeue() else {
                break;
            };

            debug!("Worker {} picked up {}", self.id, item.key);
            self.process_item(item).await;
            processed += 1;

            tokio::select! {
                _ = tokio::time::sleep(self.ctx.inter_task_delay) => {}
                _ = self.ctx.cancel.cancelled() => {
                    debug!("Worker {} stopping on cancellation", self.id);
                    break;
                }
            }
        }

        debug!("Worker {} finished after {} items", self.id, processed);
        processed
    }

    async fn process_item(&self, item: WorkItem) {
        let id = self.id;
        let executor: &TransformExecutor = &self.ctx.executor;
        let target = &item;
        let retried = self
            .ctx
            .retry
            .run(move |attempt| {
                debug!("Worker {} attempt {} for {}", id, attempt + 1, target.key);
                executor.execute(target)
            })
            .await;
        let attempts = retried.attempts;

        let outcome = match retried.result {
            Ok(artifact) => match self.write_artifact(&item, &artifact).await {
                Ok(location) => {
                    info!(
                        "Transformed {} -> {} ({} -> {} bytes, {} attempt(s))",
                        item.key,
                        location.display(),
                        artifact.original_size,
                        artifact.artifact_size,
                        attempts
                    );
                    TransformOutcome::Success(SuccessRecord::new(&artifact, location, attempts))
                }
                Err(err) => {
                    error!("Failed to write output for {}: {}", item.key, err);
                    TransformOutcome::Failure(FailureRecord::from_error(&err, attempts))
                }
            },
            Err(err) => {
                error!("Giving up on {} after {} attempt(s): {}", item.key, attempts, err);
                TransformOutcome::Failure(FailureRecord::from_error(&err, attempts))
            }
        };

        if outcome.is_success() {
            if let Some(quarantine) = &self.ctx.quarantine {
                match quarantine.release(&item).await {
                    Ok(true) => info!("Recovered {} from holding area", item.key),
                    Ok(false) => {}
                    Err(e) => warn!("{}", e),
                }
            }
        }

        self.ctx.sink.record(item, outcome);
    }

    async fn write_artifact(
        &self,
        item: &WorkItem,
        artifact: &TransformedArtifact,
    ) -> Result<PathBuf, TransformError> {
        let location = self.ctx.placement.locate(item);
        if let Some(parent) = location.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&location, &artifact.bytes).await?;
        Ok(location)
    }
}
