use std::time::Duration;

/// High-level classification of a transport error for reconnect purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or read timed out.
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection refused/reset, stream dropped).
    Connection,
    /// HTTP status that is retryable but not strictly throttling (5xx).
    Http5xx(u16),
    /// Anything else (4xx, bad URL); never reconnected.
    Other,
}

/// Decision returned by the reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Leave the subscription closed.
    GiveUp,
    /// Reopen the channel after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff with caps. `max_attempts == 0` disables reconnecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Maximum number of reconnect attempts after the initial connection.
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
    /// A connection that delivered progress and stayed up this long resets
    /// the attempt count. Shorter-lived connections keep counting, so a
    /// flapping server still runs out of attempts.
    pub stable_after: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ReconnectPolicy {
    /// No reconnect: a transport error closes the subscription.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            stable_after: Duration::from_secs(30),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Whether a connection that was up for `uptime` counts as healthy.
    pub fn is_stable(&self, uptime: Duration) -> bool {
        uptime >= self.stable_after
    }

    /// Decide whether to reconnect after a failure.
    ///
    /// `attempt` is 1-based (1 = first reconnect after the original channel failed).
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> ReconnectDecision {
        if attempt == 0 || attempt > self.max_attempts {
            return ReconnectDecision::GiveUp;
        }

        match kind {
            ErrorKind::Other => ReconnectDecision::GiveUp,
            ErrorKind::Timeout
            | ErrorKind::Connection
            | ErrorKind::Throttled
            | ErrorKind::Http5xx(_) => {
                // base * 2^(attempt-1), capped.
                let exp = 1u32 << attempt.saturating_sub(1).min(8);
                let raw = self.base_delay.saturating_mul(exp);
                ReconnectDecision::RetryAfter(raw.min(self.max_delay))
            }
        }
    }
}
