//! Retry logic with exponential backoff for provider calls.
//!
//! The resolution core never retries on its own; this is an opt-in policy at
//! the provider boundary (see [`SemanticConfig::retry_config`](crate::SemanticConfig::retry_config)).

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::SemanticError;

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call.
    pub max_retries: u32,
    /// Initial delay between retries (base for exponential backoff) in milliseconds.
    #[serde(with = "crate::serde_millis")]
    pub base_delay: Duration,
    /// Maximum delay between retries in milliseconds.
    #[serde(with = "crate::serde_millis")]
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Add random jitter to prevent thundering herd.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Calculate delay for a specific retry attempt (0-indexed).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        // base_delay * multiplier^(attempt-1), capped at max_delay
        let exponential =
            self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);
        let delay_ms = exponential.min(self.max_delay.as_millis() as f64) as u64;

        // ±25% jitter
        if self.jitter {
            let jitter_range = delay_ms / 4;
            if jitter_range > 0 {
                let jitter = fastrand::u64(0..jitter_range * 2);
                return Duration::from_millis(delay_ms.saturating_sub(jitter_range) + jitter);
            }
        }

        Duration::from_millis(delay_ms)
    }
}

/// Result of a retryable operation.
#[derive(Debug)]
pub struct RetryResult<T> {
    /// The final result (success or last error).
    pub result: Result<T, SemanticError>,
    /// Number of attempts made (1 = first try succeeded).
    pub attempts: u32,
    /// Total time spent, including backoff sleeps.
    pub total_duration: Duration,
}

impl<T> RetryResult<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<T, SemanticError> {
        self.result
    }
}

/// Run `operation` until it succeeds, fails with a non-transient error, or the
/// retry budget is spent.
pub async fn execute_with_retry_async<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> RetryResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, SemanticError>>,
{
    let start = Instant::now();
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return RetryResult {
                    result: Ok(value),
                    attempts: attempt + 1,
                    total_duration: start.elapsed(),
                };
            }
            Err(err) if err.is_transient() && attempt < config.max_retries => {
                attempt += 1;
                let delay = config.calculate_delay(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "provider_retry");
                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
            Err(err) => {
                return RetryResult {
                    result: Err(err),
                    attempts: attempt + 1,
                    total_duration: start.elapsed(),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay, Duration::from_millis(100));
        assert_eq!(config.max_delay, Duration::from_secs(5));
        assert!(config.jitter);
    }

    #[test]
    fn test_calculate_delay_no_delay_on_first_attempt() {
        let config = RetryConfig::default();
        assert_eq!(config.calculate_delay(0), Duration::ZERO);
    }

    #[test]
    fn test_calculate_delay_exponential_without_jitter() {
        let config = RetryConfig::default()
            .with_base_delay(Duration::from_millis(100))
            .with_jitter(false);
        assert_eq!(config.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(config.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(config.calculate_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_calculate_delay_capped() {
        let config = RetryConfig::default()
            .with_base_delay(Duration::from_millis(1000))
            .with_max_delay(Duration::from_millis(1500))
            .with_jitter(false);
        assert_eq!(config.calculate_delay(5), Duration::from_millis(1500));
    }

    #[test]
    fn test_calculate_delay_jitter_within_bounds() {
        let config = RetryConfig::default().with_base_delay(Duration::from_millis(400));
        for _ in 0..50 {
            let d = config.calculate_delay(1).as_millis();
            assert!((300..=500).contains(&d), "delay {d} out of jitter range");
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let config = RetryConfig::default()
            .with_max_retries(3)
            .with_base_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result = execute_with_retry_async(&config, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(SemanticError::Unavailable("HTTP 503".into()))
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert!(result.is_success());
        assert_eq!(result.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let config = RetryConfig::default().with_base_delay(Duration::from_millis(1));

        let result: RetryResult<()> = execute_with_retry_async(&config, |_| async {
            Err(SemanticError::Malformed("bad payload".into()))
        })
        .await;

        assert_eq!(result.attempts, 1);
        assert!(matches!(result.into_result(), Err(SemanticError::Malformed(_))));
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let config = RetryConfig::default()
            .with_max_retries(2)
            .with_base_delay(Duration::from_millis(1));

        let result: RetryResult<()> = execute_with_retry_async(&config, |_| async {
            Err(SemanticError::Timeout(10))
        })
        .await;

        assert_eq!(result.attempts, 3);
        assert!(!result.is_success());
    }

    #[test]
    fn retry_config_serde_uses_millis() {
        let config = RetryConfig::default();
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["base_delay"], 100);
        assert_eq!(json["max_delay"], 5000);
        let back: RetryConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
