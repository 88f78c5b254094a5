//! Recovery Policy
//!
//! Decides how long to wait before restarting a failed feed session. PDAX
//! goes down every night for maintenance; a failure during that window waits
//! out the whole outage instead of the regular retry delay.

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

/// Start of the nightly maintenance window (UTC, minutes since midnight).
pub const MAINTENANCE_START_MINUTE: u32 = 22 * 60 + 55;

/// End of the nightly maintenance window (UTC, minutes since midnight).
pub const MAINTENANCE_END_MINUTE: u32 = 23 * 60 + 35;

/// Restart delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryConfig {
    /// Delay after an ordinary failure.
    pub retry_delay: Duration,
    /// Delay after a failure inside the maintenance window.
    pub maintenance_delay: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(15 * 60),
            maintenance_delay: Duration::from_secs(35 * 60),
        }
    }
}

/// Why a session is being restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryReason {
    /// The venue is in its nightly maintenance window.
    Maintenance,
    /// Any other failure.
    Failure,
}

impl RecoveryReason {
    /// Get the reason name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Failure => "failure",
        }
    }
}

/// Classified restart decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryDecision {
    /// Classification.
    pub reason: RecoveryReason,
    /// How long to wait before the next attempt.
    pub delay: Duration,
}

/// Time-of-day based restart policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryPolicy {
    config: RecoveryConfig,
}

impl RecoveryPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(config: RecoveryConfig) -> Self {
        Self { config }
    }

    /// Decide the restart delay for a failure observed at `now`.
    #[must_use]
    pub fn decide(&self, now: DateTime<Utc>) -> RecoveryDecision {
        if is_maintenance_window(now) {
            RecoveryDecision {
                reason: RecoveryReason::Maintenance,
                delay: self.config.maintenance_delay,
            }
        } else {
            RecoveryDecision {
                reason: RecoveryReason::Failure,
                delay: self.config.retry_delay,
            }
        }
    }
}

/// Check if `now` falls strictly inside the maintenance window.
///
/// Only the time of day counts, truncated to the minute.
#[must_use]
pub fn is_maintenance_window(now: DateTime<Utc>) -> bool {
    let minute = now.hour() * 60 + now.minute();
    minute > MAINTENANCE_START_MINUTE && minute < MAINTENANCE_END_MINUTE
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, second).unwrap()
    }

    #[test_case(23, 0, 0 => true; "inside")]
    #[test_case(22, 50, 0 => false; "before")]
    #[test_case(23, 40, 0 => false; "after")]
    #[test_case(22, 55, 0 => false; "start is exclusive")]
    #[test_case(22, 55, 59 => false; "seconds are truncated at start")]
    #[test_case(22, 56, 0 => true; "first minute inside")]
    #[test_case(23, 34, 59 => true; "last minute inside")]
    #[test_case(23, 35, 0 => false; "end is exclusive")]
    #[test_case(11, 0, 0 => false; "midday")]
    fn maintenance_window(hour: u32, minute: u32, second: u32) -> bool {
        is_maintenance_window(at(hour, minute, second))
    }

    #[test]
    fn window_ignores_date() {
        let other_day = Utc.with_ymd_and_hms(1999, 12, 31, 23, 0, 0).unwrap();
        assert!(is_maintenance_window(other_day));
    }

    #[test]
    fn maintenance_waits_longer() {
        let policy = RecoveryPolicy::default();

        let decision = policy.decide(at(23, 0, 0));
        assert_eq!(decision.reason, RecoveryReason::Maintenance);
        assert_eq!(decision.delay, Duration::from_secs(35 * 60));

        let decision = policy.decide(at(22, 50, 0));
        assert_eq!(decision.reason, RecoveryReason::Failure);
        assert_eq!(decision.delay, Duration::from_secs(15 * 60));
    }

    #[test]
    fn configured_delays() {
        let policy = RecoveryPolicy::new(RecoveryConfig {
            retry_delay: Duration::from_secs(1),
            maintenance_delay: Duration::from_secs(2),
        });
        assert_eq!(policy.decide(at(23, 10, 0)).delay, Duration::from_secs(2));
        assert_eq!(policy.decide(at(8, 0, 0)).delay, Duration::from_secs(1));
    }
}
