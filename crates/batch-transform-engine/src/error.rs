use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole pass before any item is processed
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Source root does not exist or is not a directory: {0}")]
    SourceRootMissing(PathBuf),

    #[error("Failed to create output directory {path}: {source}")]
    OutputRootUncreatable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Holding area {path} is unreadable: {source}")]
    HoldingAreaUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source root {source_root} lies inside the holding area {holding_area}")]
    SourceInHoldingArea {
        source_root: PathBuf,
        holding_area: PathBuf,
    },

    #[error("Failed to scan source tree {path}: {source}")]
    DiscoveryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the error came from validating the pass's inputs
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            EngineError::SourceRootMissing(_)
                | EngineError::OutputRootUncreatable { .. }
                | EngineError::HoldingAreaUnreadable { .. }
                | EngineError::SourceInHoldingArea { .. }
                | EngineError::DiscoveryFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Holding-area failures. Logged and counted, never escalated.
#[derive(Error, Debug)]
pub enum QuarantineError {
    #[error("Failed to create holding area {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} into holding area: {source}")]
    Copy {
        from: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {path} from holding area: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list holding area {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<QuarantineError> for EngineError {
    fn from(err: QuarantineError) -> Self {
        match err {
            QuarantineError::List { path, source } => {
                EngineError::HoldingAreaUnreadable { path, source }
            }
            QuarantineError::CreateDir { source, .. }
            | QuarantineError::Copy { source, .. }
            | QuarantineError::Remove { source, .. } => EngineError::IoError(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_classification() {
        assert!(EngineError::SourceRootMissing(PathBuf::from("/nope")).is_setup());
        assert!(!EngineError::InvalidConfig("bad".to_string()).is_setup());
        assert!(EngineError::SourceInHoldingArea {
            source_root: PathBuf::from("/out/_failed"),
            holding_area: PathBuf::from("/out/_failed"),
        }
        .is_setup());
    }

    #[test]
    fn test_list_failure_becomes_unreadable_holding_area() {
        let err: EngineError = QuarantineError::List {
            path: PathBuf::from("/out/_failed"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();

        assert!(matches!(err, EngineError::HoldingAreaUnreadable { .. }));
        assert!(err.is_setup());
        assert!(err.to_string().contains("/out/_failed"));
    }
}
