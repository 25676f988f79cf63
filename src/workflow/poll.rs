use crate::config::PollingConfig;
use crate::error::{AppError, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Pacing and limits for status polling
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second status check
    pub interval: Duration,
    /// Growth of the delay per check
    pub backoff_factor: f64,
    pub max_interval: Duration,
    /// `None` polls until a terminal status
    pub max_polls: Option<u32>,
    /// Extra attempts for a status check that failed without a response
    pub transient_retries: u32,
}

impl PollPolicy {
    /// No delay between checks; used by tests and scripted servers
    pub fn immediate() -> Self {
        Self {
            interval: Duration::ZERO,
            backoff_factor: 1.0,
            max_interval: Duration::ZERO,
            max_polls: None,
            transient_retries: 0,
        }
    }

    /// Limit the number of status checks; 0 polls until a terminal status
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = (max_polls > 0).then_some(max_polls);
        self
    }

    pub fn with_transient_retries(mut self, retries: u32) -> Self {
        self.transient_retries = retries;
        self
    }

    /// Delay to wait after the `polls`-th status check
    pub fn delay_after(&self, polls: u32) -> Duration {
        self.scaled(self.backoff_factor, polls.saturating_sub(1))
    }

    /// Delay before retry number `attempt` (1-based) of a failed status check
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        // Exponential backoff
        self.scaled(2.0, attempt.saturating_sub(1))
    }

    fn scaled(&self, factor: f64, exponent: u32) -> Duration {
        let exponent = exponent.min(64) as i32;
        let secs = self.interval.as_secs_f64() * factor.powi(exponent);
        if !secs.is_finite() || secs >= self.max_interval.as_secs_f64() {
            return self.max_interval;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            backoff_factor: config.backoff_factor.max(1.0),
            max_interval: Duration::from_millis(config.max_interval_ms.max(config.interval_ms)),
            max_polls: (config.max_polls > 0).then_some(config.max_polls),
            transient_retries: config.transient_retries,
        }
    }
}

/// Run `future` unless `cancel` fires first
pub async fn until_cancelled<F, T>(cancel: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased; // Check cancellation first

        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = future => result,
    }
}

/// Sleep for `delay`, waking early with `Cancelled` if `cancel` fires
pub async fn pause(delay: Duration, cancel: &CancellationToken) -> Result<()> {
    if delay.is_zero() {
        return if cancel.is_cancelled() {
            Err(AppError::Cancelled)
        } else {
            Ok(())
        };
    }
    until_cancelled(cancel, async {
        tokio::time::sleep(delay).await;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(100),
            backoff_factor: 2.0,
            max_interval: Duration::from_millis(500),
            max_polls: None,
            transient_retries: 0,
        }
    }

    #[test]
    fn test_delay_backoff_and_ceiling() {
        let policy = policy();
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
        assert_eq!(policy.delay_after(4), Duration::from_millis(500));
        assert_eq!(policy.delay_after(1_000), Duration::from_millis(500));
    }

    #[test]
    fn test_retry_delay_doubles() {
        let policy = PollPolicy {
            backoff_factor: 1.0,
            ..policy()
        };
        assert_eq!(policy.retry_delay(1), Duration::from_millis(100));
        assert_eq!(policy.retry_delay(2), Duration::from_millis(200));
    }

    #[test]
    fn test_immediate_policy_never_waits() {
        let policy = PollPolicy::immediate();
        assert_eq!(policy.delay_after(1), Duration::ZERO);
        assert_eq!(policy.delay_after(50), Duration::ZERO);
    }

    #[test]
    fn test_from_config() {
        let config = PollingConfig {
            interval_ms: 200,
            backoff_factor: 1.5,
            max_interval_ms: 2_000,
            max_polls: 0,
            transient_retries: 2,
        };
        let policy = PollPolicy::from(&config);
        assert_eq!(policy.max_polls, None);
        assert_eq!(policy.transient_retries, 2);
        assert_eq!(policy.interval, Duration::from_millis(200));

        let bounded = PollPolicy::from(&PollingConfig {
            max_polls: 30,
            ..config
        });
        assert_eq!(bounded.max_polls, Some(30));
    }

    #[test]
    fn test_with_max_polls_zero_is_unbounded() {
        assert_eq!(PollPolicy::immediate().with_max_polls(0).max_polls, None);
        assert_eq!(PollPolicy::immediate().with_max_polls(4).max_polls, Some(4));
    }

    #[tokio::test]
    async fn test_pause_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = pause(Duration::from_secs(60), &cancel).await;
        assert!(matches!(result, Err(AppError::Cancelled)));
    }

    #[tokio::test]
    async fn test_until_cancelled_passes_result_through() {
        let cancel = CancellationToken::new();
        let value = tokio_test::assert_ok!(
            until_cancelled(&cancel, async { Ok::<_, AppError>(7) }).await
        );
        assert_eq!(value, 7);
    }
}
