mod error;
mod item;
mod outcome;

pub use error::{CoreError, Result, TransformError};
pub use item::{MediaKind, WorkItem};
pub use outcome::{FailureKind, FailureRecord, SuccessRecord, TransformOutcome, TransformedArtifact};
