use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::TransformError;

/// Artifact returned by a successful transform call
#[derive(Debug, Clone)]
pub struct TransformedArtifact {
    pub bytes: Bytes,
    pub original_size: u64,
    pub artifact_size: u64,
}

impl TransformedArtifact {
    pub fn new(bytes: Bytes, original_size: u64) -> Self {
        let artifact_size = bytes.len() as u64;
        TransformedArtifact {
            bytes,
            original_size,
            artifact_size,
        }
    }

    /// Fraction of the original size saved (negative when the artifact grew)
    pub fn savings_ratio(&self) -> f64 {
        savings_ratio(self.original_size, self.artifact_size)
    }
}

pub(crate) fn savings_ratio(original: u64, artifact: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    1.0 - (artifact as f64 / original as f64)
}

/// Classification attached to a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Timeout,
    HttpStatus,
    Unsupported,
    Io,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::Timeout => "timeout",
            FailureKind::HttpStatus => "http_status",
            FailureKind::Unsupported => "unsupported",
            FailureKind::Io => "io",
            FailureKind::Unknown => "unknown",
        }
    }

    /// Whether a retry can plausibly change the result.
    ///
    /// Only used for diagnostics; retry decisions ignore it.
    pub fn is_permanent(&self) -> bool {
        matches!(self, FailureKind::Unsupported)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessRecord {
    pub original_size: u64,
    pub artifact_size: u64,
    pub savings_ratio: f64,
    pub output_location: PathBuf,
    /// Adapter invocations spent on this item
    pub attempts: u32,
}

impl SuccessRecord {
    pub fn new(artifact: &TransformedArtifact, output_location: PathBuf, attempts: u32) -> Self {
        SuccessRecord {
            original_size: artifact.original_size,
            artifact_size: artifact.artifact_size,
            savings_ratio: artifact.savings_ratio(),
            output_location,
            attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub reason: String,
    pub classification: FailureKind,
    pub attempts: u32,
}

impl FailureRecord {
    pub fn from_error(error: &TransformError, attempts: u32) -> Self {
        FailureRecord {
            reason: error.to_string(),
            classification: error.kind(),
            attempts,
        }
    }
}

/// Terminal result for one work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransformOutcome {
    Success(SuccessRecord),
    Failure(FailureRecord),
}

impl TransformOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransformOutcome::Success(_))
    }

    pub fn attempts(&self) -> u32 {
        match self {
            TransformOutcome::Success(s) => s.attempts,
            TransformOutcome::Failure(f) => f.attempts,
        }
    }
}
