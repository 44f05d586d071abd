//! Bounded retry with linear backoff for weather lookups.
//!
//! Each attempt is classified as either:
//! - Transient: timeouts, connection failures, 5xx server errors. Retried.
//! - Rejected: 4xx client errors, malformed payloads. Returned immediately.
//!
//! The wait after a failed attempt `n` is `backoff_unit * n`, so with the
//! default 1000ms unit the schedule is 1000ms, 2000ms, ... and nothing after
//! the final attempt.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::WeatherError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_UNIT_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Multiplied by the attempt number to get the wait before the next attempt
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: Duration::from_millis(DEFAULT_BACKOFF_UNIT_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy always allows at least one attempt.
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt)
    }
}

/// Error classification for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

/// Outcome of a single failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Worth another attempt.
    Transient(String),
    /// Caller-class failure; stop now.
    Rejected(String),
}

impl AttemptError {
    /// Classify a transport-level reqwest error.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        match is_retryable_error(error) {
            RetryDecision::Retry => Self::Transient(error.to_string()),
            RetryDecision::NoRetry => Self::Rejected(error.to_string()),
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode) -> Self {
        let message = format!("HTTP {}", status);
        match is_retryable_status(status) {
            RetryDecision::Retry => Self::Transient(message),
            RetryDecision::NoRetry => Self::Rejected(message),
        }
    }
}

/// Check if a reqwest error is retryable
pub fn is_retryable_error(error: &reqwest::Error) -> RetryDecision {
    if error.is_timeout() {
        tracing::debug!("Request timed out, will retry");
        return RetryDecision::Retry;
    }

    if error.is_connect() {
        tracing::debug!("Connection error, will retry");
        return RetryDecision::Retry;
    }

    // A request we could not even build will fail the same way next time
    if error.is_builder() {
        tracing::debug!("Request builder error, not retryable");
        return RetryDecision::NoRetry;
    }

    if let Some(status) = error.status() {
        return is_retryable_status(status);
    }

    // Resets, truncated bodies and other network faults
    RetryDecision::Retry
}

/// Check if a status code is retryable.
///
/// Every 4xx is final, including 408 and 429.
pub fn is_retryable_status(status: StatusCode) -> RetryDecision {
    if status.is_server_error() {
        tracing::debug!("Server error ({}), will retry", status);
        return RetryDecision::Retry;
    }

    if status.is_client_error() {
        tracing::debug!("Client error ({}), not retryable", status);
        return RetryDecision::NoRetry;
    }

    RetryDecision::NoRetry
}

enum RetryState<T> {
    Attempting(u32),
    Waiting { next: u32, delay: Duration },
    Succeeded { value: T, attempts: u32 },
    FailedTerminal(WeatherError),
}

/// Run `operation` under `policy`.
///
/// `operation` receives the 1-based attempt number. Attempts are strictly
/// sequential; the caller is suspended until success, a rejected attempt,
/// or exhaustion.
///
/// # Errors
/// `WeatherError::Rejected` on the first rejected attempt,
/// `WeatherError::Unavailable` once `max_attempts` transient failures occurred.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, WeatherError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut state = RetryState::Attempting(1);

    loop {
        state = match state {
            RetryState::Attempting(attempt) => match operation(attempt).await {
                Ok(value) => RetryState::Succeeded {
                    value,
                    attempts: attempt,
                },
                Err(AttemptError::Rejected(message)) => {
                    tracing::debug!("Non-retryable failure on attempt {}: {}", attempt, message);
                    RetryState::FailedTerminal(WeatherError::Rejected { message })
                }
                Err(AttemptError::Transient(message)) if attempt >= max_attempts => {
                    tracing::error!("All {} attempts exhausted, last error: {}", attempt, message);
                    RetryState::FailedTerminal(WeatherError::Unavailable {
                        attempts: attempt,
                        last_error: message,
                    })
                }
                Err(AttemptError::Transient(message)) => {
                    let delay = policy.delay_after(attempt);
                    tracing::warn!(
                        "Retryable error on attempt {} of {}: {}; waiting {:?}",
                        attempt,
                        max_attempts,
                        message,
                        delay
                    );
                    RetryState::Waiting {
                        next: attempt + 1,
                        delay,
                    }
                }
            },
            RetryState::Waiting { next, delay } => {
                tokio::time::sleep(delay).await;
                RetryState::Attempting(next)
            }
            RetryState::Succeeded { value, attempts } => {
                if attempts > 1 {
                    tracing::info!("Request succeeded on attempt {}", attempts);
                }
                return Ok(value);
            }
            RetryState::FailedTerminal(error) => return Err(error),
        };
    }
}
