//! Reconnect-on-init schedule.
//!
//! When no contact point accepts the first connection and `reconnect-on-init`
//! is set, bootstrap sleeps for `calculate_backoff(retry)` and walks the
//! endpoint list again. Pipeline failures (`NoAvailableContactPoints`) are
//! final and never retried.

use crate::base::neterror::NetError;
use serde::Deserialize;
use std::time::Duration;

/// Why a pass over the contact points failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// An unresolved endpoint did not resolve at connect time
    Unresolvable,
    /// Node refused the connection
    ConnectionRefused,
    /// Connection attempt failed
    ConnectionFailed,
    /// Connection attempt timed out
    ConnectionTimedOut,
}

impl RetryReason {
    /// Classify a connect failure. `None` means retrying cannot help.
    pub fn from_error(error: &NetError) -> Option<Self> {
        match error {
            e if e.is_resolution_error() => Some(Self::Unresolvable),
            NetError::ConnectionRefused => Some(Self::ConnectionRefused),
            NetError::ConnectionFailed => Some(Self::ConnectionFailed),
            NetError::ConnectionFailedTo { source, .. } => {
                match source.kind() {
                    std::io::ErrorKind::ConnectionRefused => Some(Self::ConnectionRefused),
                    _ => Some(Self::ConnectionFailed),
                }
            }
            NetError::ConnectionTimedOut => Some(Self::ConnectionTimedOut),
            _ => None,
        }
    }
}

/// Backoff schedule for reconnect-on-init.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryConfig {
    /// Extra passes after the first one fails (default: 3)
    pub max_attempts: usize,
    /// Delay before the first retry in milliseconds (default: 1000)
    pub base_delay_ms: u64,
    /// Upper bound for a single delay in milliseconds (default: 60000)
    pub max_delay_ms: u64,
    /// Fraction of the delay added as jitter, 0.0-1.0 (default: 0.1)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// One pass, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }

    /// Every delay this schedule will sleep, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_attempts).map(move |retry| calculate_backoff(retry, self))
    }
}

/// Delay before retry number `retry` (1-based). Retry 0 is the first pass
/// and does not wait.
///
/// Doubles from `base_delay_ms`, capped at `max_delay_ms`, plus a
/// deterministic jitter of at most `jitter_factor` of the capped delay.
pub fn calculate_backoff(retry: usize, config: &RetryConfig) -> Duration {
    let Some(doublings) = retry.checked_sub(1) else {
        return Duration::ZERO;
    };

    let factor = 1u64 << doublings.min(20);
    let capped = config
        .base_delay_ms
        .saturating_mul(factor)
        .min(config.max_delay_ms);

    let spread = (capped as f64 * config.jitter_factor.clamp(0.0, 1.0)) as u64;
    let jitter = match spread {
        0 => 0,
        spread => (retry as u64).wrapping_mul(7919) % spread,
    };
    Duration::from_millis(capped.saturating_add(jitter))
}

/// Whether another pass is allowed after `retries` retries have been made.
pub fn should_retry(retries: usize, config: &RetryConfig) -> bool {
    retries < config.max_attempts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    fn without_jitter(base_delay_ms: u64, max_delay_ms: u64) -> RetryConfig {
        RetryConfig {
            base_delay_ms,
            max_delay_ms,
            jitter_factor: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let config = without_jitter(100, 60_000);
        let delays: Vec<_> = (0..4).map(|r| calculate_backoff(r, &config)).collect();
        assert_eq!(
            delays,
            [0, 100, 200, 400].map(Duration::from_millis).to_vec()
        );
    }

    #[test]
    fn test_backoff_capped() {
        let config = without_jitter(1000, 2000);
        assert_eq!(calculate_backoff(5, &config), Duration::from_millis(2000));
        assert_eq!(calculate_backoff(200, &config), Duration::from_millis(2000));
    }

    #[test]
    fn test_jitter_stays_within_factor() {
        let config = RetryConfig::default();
        for retry in 1..=8 {
            let plain = calculate_backoff(retry, &without_jitter(1000, 60_000));
            let jittered = calculate_backoff(retry, &config);
            assert!(jittered >= plain);
            assert!(jittered <= plain + plain / 10);
        }
    }

    #[test]
    fn test_schedule_length() {
        assert_eq!(RetryConfig::default().delays().count(), 3);
        assert_eq!(RetryConfig::no_retry().delays().count(), 0);
        assert!(should_retry(2, &RetryConfig::default()));
        assert!(!should_retry(3, &RetryConfig::default()));
        assert!(!should_retry(0, &RetryConfig::no_retry()));
    }

    #[test]
    fn test_reason_classification() {
        assert_eq!(
            RetryReason::from_error(&NetError::NameNotResolved),
            Some(RetryReason::Unresolvable)
        );
        assert_eq!(
            RetryReason::from_error(&NetError::ConnectionFailedTo {
                host: "127.0.1.1".into(),
                port: 9042,
                source: Arc::new(io::Error::from(io::ErrorKind::ConnectionRefused)),
            }),
            Some(RetryReason::ConnectionRefused)
        );
        assert_eq!(RetryReason::from_error(&NetError::NoAvailableContactPoints), None);
        assert_eq!(
            RetryReason::from_error(&NetError::InvalidContactPoint {
                contact_point: "nope".into()
            }),
            None
        );
    }
}
