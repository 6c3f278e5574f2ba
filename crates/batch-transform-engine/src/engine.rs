//! Pass orchestration: setup checks, discovery, the worker pool and the
//! quarantine commit.

use crate::{
    adapter::TransformAdapter,
    config::EngineConfig,
    discovery,
    error::{EngineError, Result},
    executor::TransformExecutor,
    paths::OutputPlacement,
    pool::{PoolOutcome, WorkerPool},
    quarantine::QuarantineManager,
    queue::WorkQueue,
    sink::{PassStats, ResultSet, ResultSink},
    worker::WorkerContext,
};
use batch_transform_core::WorkItem;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassMode {
    Full,
    Recovery,
}

impl PassMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassMode::Full => "full",
            PassMode::Recovery => "recovery",
        }
    }
}

/// Everything a caller needs to report on a finished pass
#[derive(Debug, Serialize)]
pub struct PassReport {
    pub pass_id: Uuid,
    pub mode: PassMode,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub results: ResultSet,
    pub stats: PassStats,
    pub workers_spawned: usize,
    /// Distinct names in the holding area attributable to this pass
    pub quarantined: usize,
    /// Items never dequeued because the pass was cancelled
    pub unprocessed: usize,
}

impl PassReport {
    fn empty(mode: PassMode, started_at: DateTime<Utc>) -> Self {
        PassReport {
            pass_id: Uuid::new_v4(),
            mode,
            started_at,
            elapsed_ms: 0,
            results: ResultSet::default(),
            stats: PassStats::default(),
            workers_spawned: 0,
            quarantined: 0,
            unprocessed: 0,
        }
    }
}

/// Bounded-concurrency batch transformer
pub struct Engine {
    config: EngineConfig,
    adapter: Arc<dyn TransformAdapter>,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(config: EngineConfig, adapter: Arc<dyn TransformAdapter>) -> Result<Self> {
        config.validate()?;
        Ok(Engine {
            config,
            adapter,
            cancel: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Token that stops workers from taking new items when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Transform every supported file under `source_root` into `output_root`,
    /// then commit failures to the holding area.
    pub async fn run_full_pass(&self, source_root: &Path, output_root: &Path) -> Result<PassReport> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let is_dir = tokio::fs::metadata(source_root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(EngineError::SourceRootMissing(source_root.to_path_buf()));
        }

        tokio::fs::create_dir_all(output_root)
            .await
            .map_err(|source| EngineError::OutputRootUncreatable {
                path: output_root.to_path_buf(),
                source,
            })?;

        let source_root = tokio::fs::canonicalize(source_root).await?;
        let output_root = tokio::fs::canonicalize(output_root).await?;
        let quarantine = QuarantineManager::new(&output_root, &self.config.quarantine_dir);
        if source_root.starts_with(quarantine.holding_area()) {
            return Err(EngineError::SourceInHoldingArea {
                source_root,
                holding_area: quarantine.holding_area().to_path_buf(),
            });
        }

        let excluded = vec![output_root.clone(), quarantine.holding_area().to_path_buf()];
        let scan_root = source_root.clone();
        let items = tokio::task::spawn_blocking(move || discovery::discover(&scan_root, &excluded))
            .await?
            .map_err(|source| EngineError::DiscoveryFailed {
                path: source_root.clone(),
                source,
            })?;

        info!(
            "Starting full pass over {} items from {} into {}",
            items.len(),
            source_root.display(),
            output_root.display()
        );

        let placement = OutputPlacement {
            source_root,
            output_root,
            preserve_structure: self.config.preserve_structure,
        };
        let outcome = self.run_pool(items, placement, None).await;

        let commit = quarantine.commit(&outcome.results).await;
        if commit.errors > 0 {
            warn!(
                "{} holding area operations failed; see warnings above",
                commit.errors
            );
        }

        let report = self.finish(PassMode::Full, started_at, clock, outcome, commit.quarantined);
        Ok(report)
    }

    /// Re-run everything in `output_root`'s holding area, removing each
    /// copy whose item now succeeds. An absent or empty holding area yields
    /// an empty report.
    pub async fn run_recovery_pass(&self, output_root: &Path) -> Result<PassReport> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let quarantine = QuarantineManager::new(output_root, &self.config.quarantine_dir);
        let items = quarantine.list().await?;

        if items.is_empty() {
            info!(
                "Holding area {} is empty, nothing to recover",
                quarantine.holding_area().display()
            );
            return Ok(PassReport::empty(PassMode::Recovery, started_at));
        }

        info!(
            "Starting recovery pass over {} held items in {}",
            items.len(),
            quarantine.holding_area().display()
        );

        let placement = OutputPlacement {
            source_root: quarantine.holding_area().to_path_buf(),
            output_root: output_root.to_path_buf(),
            preserve_structure: false,
        };
        let outcome = self
            .run_pool(items, placement, Some(Arc::new(quarantine)))
            .await;
        let still_held = outcome.results.failed.len();

        Ok(self.finish(PassMode::Recovery, started_at, clock, outcome, still_held))
    }

    async fn run_pool(
        &self,
        items: Vec<WorkItem>,
        placement: OutputPlacement,
        quarantine: Option<Arc<QuarantineManager>>,
    ) -> PoolOutcome {
        let ctx = WorkerContext {
            queue: Arc::new(WorkQueue::new(items)),
            sink: Arc::new(ResultSink::new()),
            executor: Arc::new(TransformExecutor::new(
                self.adapter.clone(),
                self.config.timeout(),
            )),
            retry: self.config.retry_policy(),
            placement,
            inter_task_delay: self.config.inter_task_delay(),
            quarantine,
            cancel: self.cancel.clone(),
        };

        WorkerPool::new(self.config.max_concurrent).run(ctx).await
    }

    fn finish(
        &self,
        mode: PassMode,
        started_at: DateTime<Utc>,
        clock: Instant,
        outcome: PoolOutcome,
        quarantined: usize,
    ) -> PassReport {
        let report = PassReport {
            pass_id: Uuid::new_v4(),
            mode,
            started_at,
            elapsed_ms: clock.elapsed().as_millis() as u64,
            results: outcome.results,
            stats: outcome.stats,
            workers_spawned: outcome.workers_spawned,
            quarantined,
            unprocessed: outcome.unprocessed,
        };

        info!(
            "{} pass {} finished: {} succeeded, {} failed, {:.1}% saved, {} quarantined",
            mode.as_str(),
            report.pass_id,
            report.stats.succeeded,
            report.stats.failed,
            report.stats.percent_saved,
            report.quarantined
        );
        if report.unprocessed > 0 {
            warn!("Pass cancelled with {} items unprocessed", report.unprocessed);
        }

        report
    }
}

/// Holding area location for `output_root` under `config`
pub fn holding_area(output_root: &Path, config: &EngineConfig) -> PathBuf {
    output_root.join(&config.quarantine_dir)
}
