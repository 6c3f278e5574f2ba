use async_trait::async_trait;
use batch_transform_core::{MediaKind, TransformError, TransformedArtifact};
use batch_transform_engine::TransformAdapter;
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

/// Sends raw file bytes to a remote transform service and takes the
/// response body as the artifact.
pub struct HttpTransformAdapter {
    client: Client,
    endpoint: Url,
}

impl HttpTransformAdapter {
    pub fn new(endpoint: &str) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let client = Client::builder().build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TransformAdapter for HttpTransformAdapter {
    async fn transform(
        &self,
        bytes: Bytes,
        kind: MediaKind,
        timeout: Duration,
    ) -> Result<TransformedArtifact, TransformError> {
        let original_size = bytes.len() as u64;
        debug!("POST {} ({} bytes, {})", self.endpoint, original_size, kind.as_str());

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, kind.mime_type())
            .timeout(timeout)
            .body(bytes)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
            return Err(TransformError::Unsupported(format!(
                "service rejected {} input",
                kind.mime_type()
            )));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransformError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(|e| classify(e, timeout))?;
        Ok(TransformedArtifact::new(body, original_size))
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransformError {
    if err.is_timeout() {
        TransformError::Timeout(timeout)
    } else if err.is_connect() || err.is_request() || err.is_body() {
        TransformError::Network(err.to_string())
    } else {
        TransformError::Other(err.to_string())
    }
}
