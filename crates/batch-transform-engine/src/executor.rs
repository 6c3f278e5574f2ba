use crate::adapter::TransformAdapter;
use batch_transform_core::{TransformError, TransformedArtifact, WorkItem};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Runs one transform attempt for an item under the timeout budget
pub struct TransformExecutor {
    adapter: Arc<dyn TransformAdapter>,
    timeout: Duration,
}

impl TransformExecutor {
    pub fn new(adapter: Arc<dyn TransformAdapter>, timeout: Duration) -> Self {
        TransformExecutor { adapter, timeout }
    }

    /// Read the source file and hand it to the adapter.
    ///
    /// An elapsed budget becomes `TransformError::Timeout`; the adapter
    /// future is dropped at that point.
    pub async fn execute(&self, item: &WorkItem) -> Result<TransformedArtifact, TransformError> {
        let bytes = Bytes::from(tokio::fs::read(&item.source).await?);

        debug!(
            "Transforming {} ({} bytes, {}) with timeout {:?}",
            item.key,
            bytes.len(),
            item.kind.as_str(),
            self.timeout
        );

        match timeout(
            self.timeout,
            self.adapter.transform(bytes, item.kind, self.timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransformError::Timeout(self.timeout)),
        }
    }
}
