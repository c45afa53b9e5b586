//! Bounded retry for GitHub API calls.
//!
//! Each call is attempted once and then retried up to `max_retries` more times
//! while it keeps failing with a transient error. Permanent errors are
//! returned immediately.
//!
//! - `DEFAULT`: 3 retries, no delay between attempts
//! - `BACKOFF`: 3 retries with 1s, 2s, 4s delays, used by the binary so a
//!   rate limit or 5xx burst can pass before giving up

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use super::error::GitHubApiError;

/// How many times to retry, and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,

    /// Delay before the first retry. Zero means retry immediately.
    pub initial_delay: Duration,

    /// Cap for exponential growth.
    pub max_delay: Duration,

    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Three immediate retries.
    pub const DEFAULT: Self = Self {
        max_retries: 3,
        initial_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        backoff_multiplier: 1.0,
    };

    /// Three retries with 1s, 2s, 4s delays.
    pub const BACKOFF: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(8),
        backoff_multiplier: 2.0,
    };

    /// Computes the delay for the given retry attempt (0-indexed).
    ///
    /// `initial_delay * backoff_multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped_secs)
    }

    /// Returns an iterator over all retry delays.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether the retry loop is active at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    #[default]
    RetryTransient,

    /// Single attempt.
    NoRetry,
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum RetryResult<T> {
    Success(T),

    /// Still failing transiently after the last attempt.
    ExhaustedRetries {
        last_error: GitHubApiError,
        /// Attempts made, including the first.
        attempts: u32,
    },

    PermanentError(GitHubApiError),
}

impl<T> RetryResult<T> {
    pub fn into_result(self) -> Result<T, GitHubApiError> {
        match self {
            RetryResult::Success(v) => Ok(v),
            RetryResult::ExhaustedRetries { last_error, .. } => Err(last_error),
            RetryResult::PermanentError(e) => Err(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RetryResult::Success(_))
    }
}

/// Runs `operation` until it succeeds, fails permanently, or runs out of attempts.
pub async fn retry_with_backoff<T, F, Fut>(
    config: RetryConfig,
    policy: RetryPolicy,
    mut operation: F,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitHubApiError>>,
{
    let max_attempts = match policy {
        RetryPolicy::NoRetry => 1,
        RetryPolicy::RetryTransient => config.max_retries + 1,
    };
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) => e,
        };
        attempt += 1;

        if !err.kind.is_retriable() {
            return RetryResult::PermanentError(err);
        }
        if attempt >= max_attempts {
            return RetryResult::ExhaustedRetries {
                last_error: err,
                attempts: attempt,
            };
        }

        let delay = config.delay_for_attempt(attempt - 1);
        debug!(attempt, ?delay, error = %err, "retrying transient GitHub failure");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
