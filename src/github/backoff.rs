use async_trait::async_trait;
use std::time::Duration;

/// Retry policy for the contributor-stats poller.
///
/// Injected so tests can substitute a zero-delay policy and count how often
/// the poller actually waited.
#[async_trait]
pub trait Backoff: Send + Sync {
    /// Upper bound on poll attempts before giving up.
    fn max_attempts(&self) -> u32;

    /// Suspend between attempts. `attempt` is the zero-based attempt that
    /// just observed a 202.
    async fn wait(&self, attempt: u32);
}

/// Fixed delay between attempts. Worst-case wait before giving up is
/// `max_attempts * delay`.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    attempts: u32,
    delay: Duration,
}

impl FixedDelay {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        FixedDelay { attempts, delay }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        FixedDelay::new(5, Duration::from_secs(2))
    }
}

#[async_trait]
impl Backoff for FixedDelay {
    fn max_attempts(&self) -> u32 {
        self.attempts
    }

    async fn wait(&self, attempt: u32) {
        tracing::debug!(attempt, delay_ms = self.delay.as_millis() as u64, "stats not ready, waiting");
        tokio::time::sleep(self.delay).await;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_bounds() {
        let policy = FixedDelay::default();
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }
}
