//! Port configuration types.

use std::time::Duration;

/// Linear backoff between reconnection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt.
    pub initial: Duration,
    /// Increment per further failed attempt.
    pub step: Duration,
    /// Maximum delay.
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            step: Duration::from_millis(500),
            max: Duration::from_millis(5000),
        }
    }
}

impl BackoffPolicy {
    /// Create a linear policy.
    pub fn linear(initial: Duration, step: Duration, max: Duration) -> Self {
        Self { initial, step, max }
    }

    /// Create a stateful backoff counter starting at `initial`.
    pub fn start(&self) -> Backoff {
        Backoff {
            policy: *self,
            current: self.initial.min(self.max),
        }
    }
}

/// Current retry delay of a port.
///
/// The delay only grows while attempts keep failing and drops to zero on
/// [`Backoff::reset`], which happens once per successful reconnection.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    /// The delay the next failed attempt will wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Return the delay to wait now and advance toward the maximum.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        if self.current < self.policy.max {
            self.current = (self.current + self.policy.step).min(self.policy.max);
        }
        delay
    }

    /// Reset after a successful reconnection.
    pub fn reset(&mut self) {
        self.current = Duration::ZERO;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        BackoffPolicy::default().start()
    }
}

/// Network port configuration.
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Timeout for each connection attempt.
    pub connect_timeout: Duration,
    /// Write timeout. `None` blocks until the kernel accepts the bytes.
    pub write_timeout: Option<Duration>,
    /// Disable Nagle's algorithm; single-byte writes go out immediately.
    pub nodelay: bool,
    /// Delay policy between reconnection attempts.
    pub backoff: BackoffPolicy,
    /// Whether a read timeout counts as a broken link.
    pub reconnect_on_timeout: bool,
    /// Maximum reconnection attempts per episode. `None` for unlimited.
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            write_timeout: None,
            nodelay: true,
            backoff: BackoffPolicy::default(),
            reconnect_on_timeout: true,
            max_reconnect_attempts: None,
        }
    }
}

impl PortConfig {
    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Enable or disable TCP nodelay.
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Set the backoff policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Choose whether read timeouts start a reconnection.
    pub fn with_reconnect_on_timeout(mut self, enabled: bool) -> Self {
        self.reconnect_on_timeout = enabled;
        self
    }

    /// Limit the number of reconnection attempts per episode.
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Check if another reconnection attempt should be made.
    pub fn should_retry(&self, attempt: u32) -> bool {
        match self.max_reconnect_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        let mut backoff = Backoff::default();
        for n in 1..=15u64 {
            let expected = Duration::from_millis((500 * n).min(5000));
            assert_eq!(backoff.next_delay(), expected, "attempt {n}");
        }
    }

    #[test]
    fn test_backoff_reset_to_zero() {
        let mut backoff = Backoff::default();
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.current(), Duration::from_millis(1500));

        backoff.reset();
        assert_eq!(backoff.current(), Duration::ZERO);
        assert_eq!(backoff.next_delay(), Duration::ZERO);
        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let policy = BackoffPolicy::linear(
            Duration::from_millis(10),
            Duration::from_millis(7),
            Duration::from_millis(20),
        );
        let mut backoff = policy.start();
        assert_eq!(backoff.next_delay(), Duration::from_millis(10));
        assert_eq!(backoff.next_delay(), Duration::from_millis(17));
        assert_eq!(backoff.next_delay(), Duration::from_millis(20));
        assert_eq!(backoff.next_delay(), Duration::from_millis(20));
    }

    #[test]
    fn test_should_retry() {
        let config = PortConfig::default().with_max_reconnect_attempts(3);
        assert!(config.should_retry(0));
        assert!(config.should_retry(2));
        assert!(!config.should_retry(3));

        assert!(PortConfig::default().should_retry(1000));
    }

    #[test]
    fn test_port_config_builder() {
        let config = PortConfig::default()
            .with_connect_timeout(Duration::from_secs(10))
            .with_nodelay(false)
            .with_reconnect_on_timeout(false);

        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(!config.nodelay);
        assert!(!config.reconnect_on_timeout);
        assert_eq!(config.backoff, BackoffPolicy::default());
    }
}
