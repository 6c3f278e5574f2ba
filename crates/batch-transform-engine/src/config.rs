use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::retry::RetryPolicy;

/// Engine settings, passed explicitly to every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on concurrent workers
    pub max_concurrent: usize,

    /// Retries after the first attempt (0 = single attempt)
    pub max_retries: u32,

    /// Base delay for the linear retry backoff
    pub retry_base_delay_ms: u64,

    /// Fixed pause a worker takes after each item
    pub inter_task_delay_ms: u64,

    /// Per-attempt budget for the transform call
    pub timeout_secs: u64,

    /// Mirror the source tree under the output root instead of flattening
    pub preserve_structure: bool,

    /// Name of the holding area directory under the output root
    pub quarantine_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_concurrent: 4,
            max_retries: 2,
            retry_base_delay_ms: 1000,
            inter_task_delay_ms: 200,
            timeout_secs: 60,
            preserve_structure: true,
            quarantine_dir: "_failed".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(EngineError::InvalidConfig(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "timeout_secs must be at least 1".to_string(),
            ));
        }

        let dir = self.quarantine_dir.trim();
        if dir.is_empty() || dir == "." || dir == ".." || dir.contains(['/', '\\']) {
            return Err(EngineError::InvalidConfig(format!(
                "quarantine_dir must be a plain directory name, got {:?}",
                self.quarantine_dir
            )));
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn inter_task_delay(&self) -> Duration {
        Duration::from_millis(self.inter_task_delay_ms)
    }
}
