//! Scheduling configuration.

use chrono::Duration;

/// Configuration shared by the booking services.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    /// Invite token lifetime in seconds (default: 604_800 = 7 days).
    pub invite_lifetime_secs: u64,
    /// Minimum time between cancellation and session start, in seconds
    /// (default: 0, i.e. any time before the start).
    pub cancellation_notice_secs: u64,
    /// How long after its end a `Scheduled` booking waits before the sweep
    /// marks it a no-show, in seconds (default: 86_400 = 24 hours).
    pub attendance_grace_secs: u64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            invite_lifetime_secs: 604_800,
            cancellation_notice_secs: 0,
            attendance_grace_secs: 86_400,
        }
    }
}

impl SchedulingConfig {
    pub fn invite_lifetime(&self) -> Duration {
        secs(self.invite_lifetime_secs)
    }

    pub fn cancellation_notice(&self) -> Duration {
        secs(self.cancellation_notice_secs)
    }

    pub fn attendance_grace(&self) -> Duration {
        secs(self.attendance_grace_secs)
    }
}

fn secs(value: u64) -> Duration {
    Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX / 1_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SchedulingConfig::default();
        assert_eq!(config.invite_lifetime(), Duration::days(7));
        assert_eq!(config.cancellation_notice(), Duration::zero());
        assert_eq!(config.attendance_grace(), Duration::hours(24));
    }
}
