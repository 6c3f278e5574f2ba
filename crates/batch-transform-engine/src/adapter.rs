use async_trait::async_trait;
use batch_transform_core::{MediaKind, TransformError, TransformedArtifact};
use bytes::Bytes;
use std::time::Duration;

/// The external transformation service, one call per attempt.
///
/// Implementations must not retry internally and must not touch the source
/// file; the engine owns retries and output placement. `timeout` is the
/// caller's budget for this call and is also enforced by the engine.
#[async_trait]
pub trait TransformAdapter: Send + Sync {
    async fn transform(
        &self,
        bytes: Bytes,
        kind: MediaKind,
        timeout: Duration,
    ) -> Result<TransformedArtifact, TransformError>;
}

/// Returns the input unchanged. Useful for dry runs of the pipeline.
pub struct PassthroughAdapter;

#[async_trait]
impl TransformAdapter for PassthroughAdapter {
    async fn transform(
        &self,
        bytes: Bytes,
        _kind: MediaKind,
        _timeout: Duration,
    ) -> Result<TransformedArtifact, TransformError> {
        let original_size = bytes.len() as u64;
        Ok(TransformedArtifact::new(bytes, original_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_adapter() {
        let adapter = PassthroughAdapter;
        let artifact = adapter
            .transform(Bytes::from_static(b"pixels"), MediaKind::Png, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(artifact.bytes, Bytes::from_static(b"pixels"));
        assert_eq!(artifact.original_size, 6);
        assert_eq!(artifact.artifact_size, 6);
        assert_eq!(artifact.savings_ratio(), 0.0);
    }
}
