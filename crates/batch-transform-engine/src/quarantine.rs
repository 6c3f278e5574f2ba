//! Holding area for items whose last pass ended in failure.
//!
//! The holding area is a flat directory under the output root. A full pass
//! commits its failures into it; a recovery pass reads it back as a fresh
//! work queue and removes each copy whose item now succeeds. Copies are
//! keyed by base name only, so two sources sharing a name overwrite each
//! other here.

use batch_transform_core::{MediaKind, WorkItem};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::QuarantineError;
use crate::sink::ResultSet;

/// What a commit did to the holding area
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Distinct names held after the commit
    pub quarantined: usize,
    /// Stale copies removed because their item succeeded this pass
    pub released: usize,
    /// Copy or remove operations that failed
    pub errors: usize,
}

pub struct QuarantineManager {
    holding_area: PathBuf,
}

impl QuarantineManager {
    pub fn new(output_root: &Path, dir_name: &str) -> Self {
        QuarantineManager {
            holding_area: output_root.join(dir_name),
        }
    }

    pub fn holding_area(&self) -> &Path {
        &self.holding_area
    }

    /// Location of `item`'s copy in the holding area
    pub fn holding_path(&self, item: &WorkItem) -> PathBuf {
        self.holding_area.join(item.file_name())
    }

    /// Reconcile the holding area with a finished full pass.
    ///
    /// Every failed source is copied in under its base name, overwriting an
    /// existing copy. Copies left over from earlier passes whose item
    /// succeeded now are removed, unless the same name also failed in this
    /// pass. Nothing here fails the pass.
    pub async fn commit(&self, results: &ResultSet) -> CommitSummary {
        let mut summary = CommitSummary::default();

        if !results.failed.is_empty() {
            if let Err(source) = tokio::fs::create_dir_all(&self.holding_area).await {
                let err = QuarantineError::CreateDir {
                    path: self.holding_area.clone(),
                    source,
                };
                warn!("{}", err);
                summary.errors += results.failed.len();
                return summary;
            }
        }

        let mut held = HashSet::new();
        for (item, failure) in &results.failed {
            match self.admit(item).await {
                Ok(()) => {
                    held.insert(item.file_name().to_string());
                    info!(
                        "Quarantined {} ({}: {})",
                        item.key,
                        failure.classification.as_str(),
                        failure.reason
                    );
                }
                Err(e) => {
                    warn!("{}", e);
                    summary.errors += 1;
                }
            }
        }

        summary.quarantined = held.len();

        for (item, _) in &results.succeeded {
            let name = item.file_name();
            if results.failed.iter().any(|(f, _)| f.file_name() == name) {
                continue;
            }
            match self.release(item).await {
                Ok(true) => summary.released += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("{}", e);
                    summary.errors += 1;
                }
            }
        }

        summary
    }

    async fn admit(&self, item: &WorkItem) -> Result<(), QuarantineError> {
        let target = self.holding_path(item);
        if item.source == target {
            debug!("{} is already in the holding area", item.key);
            return Ok(());
        }
        tokio::fs::copy(&item.source, &target)
            .await
            .map_err(|source| QuarantineError::Copy {
                from: item.source.clone(),
                source,
            })?;
        Ok(())
    }

    /// Remove `item`'s copy from the holding area.
    ///
    /// Returns `Ok(false)` when there was no copy to remove.
    pub async fn release(&self, item: &WorkItem) -> Result<bool, QuarantineError> {
        let path = self.holding_path(item);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Released {} from holding area", item.file_name());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(QuarantineError::Remove { path, source }),
        }
    }

    /// Supported files currently held, sorted by name.
    ///
    /// An absent holding area is simply empty.
    pub async fn list(&self) -> Result<Vec<WorkItem>, QuarantineError> {
        let list_err = |source| QuarantineError::List {
            path: self.holding_area.clone(),
            source,
        };

        let mut dir = match tokio::fs::read_dir(&self.holding_area).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(list_err(e)),
        };

        let mut items = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(list_err)? {
            let path = entry.path();
            let is_file = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !is_file || hidden || MediaKind::from_path(&path).is_none() {
                continue;
            }

            match WorkItem::from_path(&self.holding_area, &path) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping held file {}: {}", path.display(), e),
            }
        }

        items.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ResultSink;
    use batch_transform_core::{FailureKind, FailureRecord, SuccessRecord, TransformOutcome};

    fn source_item(root: &Path, key: &str, contents: &[u8]) -> WorkItem {
        let path = root.join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        WorkItem::from_path(root, &path).unwrap()
    }

    fn failure() -> TransformOutcome {
        TransformOutcome::Failure(FailureRecord {
            reason: "timeout".to_string(),
            classification: FailureKind::Timeout,
            attempts: 3,
        })
    }

    fn success() -> TransformOutcome {
        TransformOutcome::Success(SuccessRecord {
            original_size: 4,
            artifact_size: 2,
            savings_ratio: 0.5,
            output_location: PathBuf::from("out"),
            attempts: 1,
        })
    }

    #[tokio::test]
    async fn test_commit_copies_failures_flat() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(out.path(), "_failed");

        let sink = ResultSink::new();
        sink.record(source_item(src.path(), "deep/dir/a.png", b"aaaa"), failure());
        sink.record(source_item(src.path(), "b.png", b"bbbb"), success());
        let (results, _) = sink.finalize();

        let summary = manager.commit(&results).await;
        assert_eq!(summary.quarantined, 1);
        assert_eq!(summary.errors, 0);

        let held = manager.list().await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].key, "a.png");
        assert_eq!(std::fs::read(&held[0].source).unwrap(), b"aaaa");
        assert!(!manager.holding_area().join("b.png").exists());
    }

    #[tokio::test]
    async fn test_commit_last_failure_wins() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(out.path(), "_failed");

        let sink = ResultSink::new();
        sink.record(source_item(src.path(), "one/logo.png", b"first"), failure());
        sink.record(source_item(src.path(), "two/logo.png", b"second"), failure());
        let (results, _) = sink.finalize();

        let summary = manager.commit(&results).await;
        assert_eq!(summary.quarantined, 1);

        let held = manager.list().await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(std::fs::read(&held[0].source).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_commit_releases_stale_copies() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(out.path(), "_failed");
        std::fs::create_dir_all(manager.holding_area()).unwrap();
        std::fs::write(manager.holding_area().join("fixed.png"), b"old").unwrap();

        let sink = ResultSink::new();
        sink.record(source_item(src.path(), "fixed.png", b"new"), success());
        let (results, _) = sink.finalize();

        let summary = manager.commit(&results).await;
        assert_eq!(summary.released, 1);
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_absent_holding_area_is_empty() {
        let out = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(out.path(), "_failed");
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_unsupported() {
        let out = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(out.path(), "_failed");
        let holding = manager.holding_area().to_path_buf();
        std::fs::create_dir_all(holding.join("nested")).unwrap();
        std::fs::write(holding.join("b.webp"), b"b").unwrap();
        std::fs::write(holding.join("a.jpg"), b"a").unwrap();
        std::fs::write(holding.join("readme.txt"), b"t").unwrap();
        std::fs::write(holding.join(".DS_Store"), b"x").unwrap();

        let keys: Vec<String> = manager
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.key)
            .collect();
        assert_eq!(keys, vec!["a.jpg", "b.webp"]);
    }

    #[tokio::test]
    async fn test_release_missing_copy() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(out.path(), "_failed");
        let item = source_item(src.path(), "a.png", b"a");

        assert!(!manager.release(&item).await.unwrap());
    }

    #[tokio::test]
    async fn test_commit_leaves_held_source_intact() {
        let out = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(out.path(), "_failed");
        let item = source_item(manager.holding_area(), "img.png", b"precious-bytes");

        let sink = ResultSink::new();
        sink.record(item, failure());
        let (results, _) = sink.finalize();

        let summary = manager.commit(&results).await;
        assert_eq!(summary.quarantined, 1);
        assert_eq!(summary.errors, 0);
        assert_eq!(
            std::fs::read(manager.holding_area().join("img.png")).unwrap(),
            b"precious-bytes"
        );
    }

    #[tokio::test]
    async fn test_commit_blocked_holding_area_is_logged_only() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let manager = QuarantineManager::new(out.path(), "_failed");
        std::fs::write(manager.holding_area(), b"not a directory").unwrap();

        let sink = ResultSink::new();
        sink.record(source_item(src.path(), "a.png", b"a"), failure());
        sink.record(source_item(src.path(), "b.png", b"b"), failure());
        let (results, _) = sink.finalize();

        let summary = manager.commit(&results).await;
        assert_eq!(summary.quarantined, 0);
        assert_eq!(summary.errors, 2);
    }
}
