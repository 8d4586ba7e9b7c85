//! Reconnect policy with compounding back-off.

use std::time::Duration;

use ev_domain::config::ReconnectConfig;

/// Delay before the first retry of an episode.
pub const BASE_DELAY: Duration = Duration::from_millis(1_000);
/// Upper bound of any retry delay.
pub const MAX_DELAY: Duration = Duration::from_millis(120_000);

/// Controls how the subscriber waits between connection attempts.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    /// Delay before the first retry of an episode.
    pub initial_delay: Duration,
    /// Maximum delay between attempts (cap).
    pub max_delay: Duration,
    /// Growth per consecutive failure:
    /// `next = current * (1 + growth_factor * failures)`.
    pub growth_factor: f64,
    /// Maximum number of consecutive retries before giving up.
    /// `0` means unlimited retries.
    pub max_attempts: u32,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            initial_delay: BASE_DELAY,
            max_delay: MAX_DELAY,
            growth_factor: 0.5,
            max_attempts: 0, // unlimited
        }
    }
}

impl From<&ReconnectConfig> for ReconnectBackoff {
    fn from(cfg: &ReconnectConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(cfg.initial_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
            growth_factor: cfg.growth_factor,
            max_attempts: cfg.max_attempts,
        }
    }
}

impl ReconnectBackoff {
    /// Delay following `current` after `failures` consecutive failures,
    /// capped at `max_delay`.
    pub fn next_delay(&self, current: Duration, failures: u32) -> Duration {
        let current_ms = current.as_millis() as f64;
        let next_ms = current_ms * (1.0 + self.growth_factor * f64::from(failures));
        let capped_ms = next_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// State at the start of a failure episode.
    pub fn start(&self) -> BackoffState {
        BackoffState {
            delay: self.initial_delay,
            failures: 0,
        }
    }

    /// Whether `failures` consecutive retries exhaust the policy.
    pub fn should_give_up(&self, failures: u32) -> bool {
        self.max_attempts > 0 && failures >= self.max_attempts
    }
}

/// [`ReconnectBackoff::next_delay`] with the default 1s/120s policy.
pub fn next_delay(current: Duration, failures: u32) -> Duration {
    ReconnectBackoff::default().next_delay(current, failures)
}

/// Back-off carried from one attempt to the next within an episode.
///
/// `delay` is what the next wait lasts; `failures` counts the retries
/// already taken.  Values are replaced, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffState {
    pub delay: Duration,
    pub failures: u32,
}

impl BackoffState {
    /// The state after one more failure.
    #[must_use]
    pub fn escalate(self, policy: &ReconnectBackoff) -> Self {
        let failures = self.failures.saturating_add(1);
        Self {
            delay: policy.next_delay(self.delay, failures),
            failures,
        }
    }
}
