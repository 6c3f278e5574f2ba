//! Per-item retry with linear backoff.

use batch_transform_core::TransformError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Where an item sits in its retry sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// About to make attempt `n` (0-indexed)
    Attempting(u32),
    Succeeded,
    ExhaustedFailed,
}

impl RetryState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryState::Attempting(_))
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Delay unit for the linear backoff
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Final result of a retry sequence
#[derive(Debug)]
pub struct RetryResult<T> {
    /// Success value, or the error of the last attempt
    pub result: Result<T, TransformError>,
    /// Number of attempts made
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before the retry that follows failed attempt `attempt_number`.
    ///
    /// Linear: base_delay * (attempt_number + 1)
    pub fn calculate_delay(&self, attempt_number: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt_number.saturating_add(1))
    }

    /// Check if another attempt is allowed after attempt `attempt_number` failed.
    pub fn should_retry(&self, attempt_number: u32) -> bool {
        attempt_number < self.max_retries
    }

    /// Next state after an attempt from `state` succeeded or failed.
    pub fn transition(&self, state: RetryState, succeeded: bool) -> RetryState {
        match state {
            RetryState::Attempting(_) if succeeded => RetryState::Succeeded,
            RetryState::Attempting(n) if self.should_retry(n) => RetryState::Attempting(n + 1),
            RetryState::Attempting(_) => RetryState::ExhaustedFailed,
            terminal => terminal,
        }
    }

    /// Drive `op` until it succeeds or retries run out.
    ///
    /// Attempts are strictly sequential. Every error kind is retried the
    /// same way; only the last attempt's error is kept.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> RetryResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, TransformError>>,
    {
        let mut attempt = 0;

        loop {
            match op(attempt).await {
                Ok(value) => {
                    return RetryResult {
                        result: Ok(value),
                        attempts: attempt + 1,
                    };
                }
                Err(err) => match self.transition(RetryState::Attempting(attempt), false) {
                    RetryState::Attempting(next) => {
                        let delay = self.calculate_delay(attempt);
                        if err.kind().is_permanent() {
                            warn!(
                                "Attempt {} failed with a non-transient error, retrying anyway in {:?}: {}",
                                attempt + 1,
                                delay,
                                err
                            );
                        } else {
                            warn!("Attempt {} failed, retrying in {:?}: {}", attempt + 1, delay, err);
                        }
                        tokio::time::sleep(delay).await;
                        attempt = next;
                    }
                    _ => {
                        return RetryResult {
                            result: Err(err),
                            attempts: attempt + 1,
                        };
                    }
                },
            }
        }
    }
}
