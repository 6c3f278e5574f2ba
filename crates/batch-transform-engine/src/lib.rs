//! Bounded-concurrency retry-queue engine for batch file transformation.
//!
//! A pass turns a list of discovered files into a [`ResultSet`]: workers
//! drain a shared [`WorkQueue`], call the [`TransformAdapter`] under a
//! [`RetryPolicy`], write artifacts to a mirrored output tree and record
//! every terminal outcome into a [`ResultSink`]. Failures are parked in a
//! holding area by the [`QuarantineManager`] and re-admitted by a later
//! recovery pass.

pub mod adapter;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod executor;
pub mod paths;
pub mod pool;
pub mod quarantine;
pub mod queue;
pub mod retry;
pub mod sink;
pub mod worker;

pub use adapter::{PassthroughAdapter, TransformAdapter};
pub use config::EngineConfig;
pub use engine::{holding_area, Engine, PassMode, PassReport};
pub use error::{EngineError, QuarantineError, Result};
pub use executor::TransformExecutor;
pub use paths::{mirror_output_path, OutputPlacement};
pub use pool::{PoolOutcome, WorkerPool};
pub use quarantine::{CommitSummary, QuarantineManager};
pub use queue::WorkQueue;
pub use retry::{RetryPolicy, RetryResult, RetryState};
pub use sink::{PassStats, ResultSet, ResultSink};
pub use worker::{Worker, WorkerContext};
