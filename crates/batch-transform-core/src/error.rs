use std::path::PathBuf;
use thiserror::Error;

use crate::outcome::FailureKind;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unsupported media kind: {0}")]
    UnsupportedKind(PathBuf),

    #[error("Path {path} is not under root {root}")]
    NotUnderRoot { path: PathBuf, root: PathBuf },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Failure of a single transform attempt.
///
/// The set is closed: adapters map whatever their transport produces onto
/// one of these variants, and the engine classifies outcomes through
/// [`TransformError::kind`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Transform timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Unexpected HTTP status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Unsupported input: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Transform error: {0}")]
    Other(String),
}

impl TransformError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TransformError::Network(_) => FailureKind::Network,
            TransformError::Timeout(_) => FailureKind::Timeout,
            TransformError::HttpStatus { .. } => FailureKind::HttpStatus,
            TransformError::Unsupported(_) => FailureKind::Unsupported,
            TransformError::Io(_) => FailureKind::Io,
            TransformError::Other(_) => FailureKind::Unknown,
        }
    }
}

impl From<std::io::Error> for TransformError {
    fn from(err: std::io::Error) -> Self {
        TransformError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_classification() {
        assert_eq!(TransformError::Network("reset".into()).kind(), FailureKind::Network);
        assert_eq!(
            TransformError::Timeout(Duration::from_secs(1)).kind(),
            FailureKind::Timeout
        );
        assert_eq!(
            TransformError::HttpStatus { status: 502, message: "bad gateway".into() }.kind(),
            FailureKind::HttpStatus
        );
        assert_eq!(TransformError::Unsupported("gif".into()).kind(), FailureKind::Unsupported);
        assert_eq!(TransformError::Other("?".into()).kind(), FailureKind::Unknown);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TransformError = io.into();
        assert_eq!(err.kind(), FailureKind::Io);
        assert!(err.to_string().contains("missing"));
    }
}
