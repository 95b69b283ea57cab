//! Retry with exponential backoff for page and sitemap fetches
//!
//! Only transient failures are retried (see [`crate::DeclutterError::is_transient`]);
//! everything else fails fast on the first attempt.

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::DeclutterResult;
use crate::utils::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_RETRY_DELAY_MS, DEFAULT_MAX_RETRIES,
    DEFAULT_MAX_RETRY_DELAY_MS,
};

/// Share of the computed delay added as random jitter, at most
const JITTER_RATIO: f64 = 0.25;

/// Retry configuration for fetch operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum retry delay
    pub max_delay: Duration,
    /// Add up to 25% random delay so parallel retries spread out
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_RETRY_DELAY_MS),
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: Duration::from_millis(DEFAULT_MAX_RETRY_DELAY_MS),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Calculate delay for given retry number (0-based), without jitter
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let multiplier = self.backoff_multiplier.powi(exponent);
        let delay_ms = self.initial_delay.as_millis() as f64 * multiplier;

        let max_ms = self.max_delay.as_millis() as f64;
        if !delay_ms.is_finite() || delay_ms > max_ms {
            self.max_delay
        } else {
            Duration::from_millis(delay_ms as u64)
        }
    }

    /// Delay for `attempt` with jitter applied when enabled
    #[must_use]
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if !self.jitter {
            return base;
        }
        let max_jitter_ms = (base.as_millis() as f64 * JITTER_RATIO) as u64;
        if max_jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..=max_jitter_ms))
    }
}

/// Result of a retried operation together with the number of attempts made
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: DeclutterResult<T>,
    pub attempts: u32,
}

/// Retry an operation with exponential backoff and error classification
///
/// `label` names the operation in log messages (usually the URL).
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DeclutterResult<T>>,
{
    let mut retries = 0u32;

    loop {
        match operation().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("{label}: succeeded after {} attempts", retries.saturating_add(1));
                }
                return Attempted {
                    result: Ok(value),
                    attempts: retries.saturating_add(1),
                };
            }
            Err(e) => {
                if !e.is_transient() {
                    debug!("{label}: permanent error, not retrying: {e}");
                    return Attempted {
                        result: Err(e),
                        attempts: retries.saturating_add(1),
                    };
                }

                if retries >= policy.max_retries {
                    warn!("{label}: giving up after {} attempts: {e}", retries.saturating_add(1));
                    return Attempted {
                        result: Err(e),
                        attempts: retries.saturating_add(1),
                    };
                }

                let delay = policy.jittered_delay(retries);
                warn!(
                    "{label}: attempt {}/{} failed ({e}), retrying in {}ms",
                    retries.saturating_add(1),
                    policy.max_retries.saturating_add(1),
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                retries += 1;
            }
        }
    }
}

/// Like [`retry_with_backoff`] but drops the attempt count
pub async fn retry<F, Fut, T>(policy: &RetryPolicy, label: &str, operation: F) -> DeclutterResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DeclutterResult<T>>,
{
    retry_with_backoff(policy, label, operation).await.result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(1_000),
            jitter: false,
        }
    }

    #[test]
    fn delays_grow_exponentially() {
        let p = policy();
        assert_eq!(p.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(p.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(p.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(p.delay_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn delays_are_capped() {
        let p = policy();
        assert_eq!(p.delay_for_attempt(4), Duration::from_millis(1_000));
        assert_eq!(p.delay_for_attempt(60), Duration::from_millis(1_000));
        assert_eq!(p.delay_for_attempt(u32::MAX), Duration::from_millis(1_000));
    }

    #[test]
    fn jitter_stays_within_a_quarter() {
        let p = RetryPolicy {
            jitter: true,
            ..policy()
        };
        for _ in 0..50 {
            let d = p.jittered_delay(1);
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(250));
        }
    }

    #[tokio::test]
    async fn max_retry_budget_does_not_overflow() {
        let p = RetryPolicy {
            max_retries: u32::MAX,
            initial_delay: Duration::from_millis(1),
            ..policy()
        };
        let mut calls = 0u32;
        let attempted = retry_with_backoff(&p, "huge", || {
            calls += 1;
            let fail = calls == 1;
            async move {
                if fail {
                    Err(crate::error::DeclutterError::from(crate::error::FetchError::Timeout {
                        url: "https://example.com".to_string(),
                    }))
                } else {
                    Ok(())
                }
            }
        })
        .await;
        assert!(attempted.result.is_ok());
        assert_eq!(attempted.attempts, 2);
    }
}
