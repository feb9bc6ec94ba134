//! Exponential backoff for transport-level retries.
use std::time::Duration;

use super::error::ClientError;

/// How many times, and how patiently, a request is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub start_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            start_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, never retried.
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }
}

/// Track failures to incrementally delay retries of a single request.
///
/// When an attempt fails call [`Backoff::retry`]; it sleeps, or hands the error back once attempts run out.
pub struct Backoff {
    delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    multiplier: u32,
    seen: u32,
}

impl Backoff {
    pub fn new(policy: &RetryPolicy) -> Backoff {
        Backoff {
            delay: policy.start_delay,
            max_delay: policy.max_delay,
            max_attempts: policy.max_attempts.max(1),
            multiplier: policy.multiplier.max(1),
            seen: 0,
        }
    }

    pub async fn retry(&mut self, error: ClientError) -> Result<(), ClientError> {
        self.seen += 1;
        if self.seen >= self.max_attempts {
            return Err(error);
        }

        tracing::warn!(
            attempt = self.seen,
            delay_ms = self.delay.as_millis() as u64,
            "request failed, will retry: {}",
            error
        );
        tokio::time::sleep(self.delay).await;
        self.delay = std::cmp::min(self.delay * self.multiplier, self.max_delay);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            start_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(250),
            multiplier: 2,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let mut backoff = Backoff::new(&policy(3));
        assert!(backoff.retry(ClientError::RequestTimeout).await.is_ok());
        assert!(backoff.retry(ClientError::RequestTimeout).await.is_ok());
        let err = backoff.retry(ClientError::RequestTimeout).await.unwrap_err();
        assert!(matches!(err, ClientError::RequestTimeout));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_grows_up_to_the_cap() {
        let mut backoff = Backoff::new(&policy(10));
        let start = tokio::time::Instant::now();
        for _ in 0..3 {
            backoff.retry(ClientError::RequestTimeout).await.unwrap();
        }
        // 100 + 200 + 250 (capped)
        assert_eq!(start.elapsed(), Duration::from_millis(550));
    }

    #[tokio::test]
    async fn single_attempt_policy_never_sleeps() {
        let mut backoff = Backoff::new(&RetryPolicy::none());
        assert!(backoff.retry(ClientError::RequestTimeout).await.is_err());
    }
}
