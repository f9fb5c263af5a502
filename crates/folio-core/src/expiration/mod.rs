//! Due-date evaluation and reminder notifications.

mod message;
mod sweep;

pub use message::{time_remaining_label, MessageContext, NotificationPayload};
pub use sweep::{ExpirationSweep, SweepFailure, SweepReport};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Urgency of an expiration reminder, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// No notification.
    None,
    /// Due within the reminder window.
    Reminder,
    /// Due within a day, or just past due.
    Urgent,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::None => "none",
            Tier::Reminder => "reminder",
            Tier::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds, in days relative to the due date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpirationPolicy {
    /// Reminders start this many days before the due date.
    pub reminder_days: f64,
    /// Reminders become urgent this many days before the due date.
    pub urgent_days: f64,
    /// Documents more than this many days past due are left alone.
    pub grace_days: f64,
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self {
            reminder_days: 7.0,
            urgent_days: 1.0,
            grace_days: 1.0,
        }
    }
}

impl ExpirationPolicy {
    /// Tier for a signed number of days remaining.
    pub fn classify(&self, days_remaining: f64) -> Tier {
        if days_remaining <= -self.grace_days {
            Tier::None
        } else if days_remaining <= self.urgent_days {
            Tier::Urgent
        } else if days_remaining <= self.reminder_days {
            Tier::Reminder
        } else {
            Tier::None
        }
    }

    /// Classify a due instant as seen from `now`.
    pub fn evaluate(&self, due_at: DateTime<Utc>, now: DateTime<Utc>) -> ExpirationDecision {
        let days_remaining = days_between(now, due_at);
        ExpirationDecision {
            days_remaining,
            tier: self.classify(days_remaining),
        }
    }
}

/// Classification of one due date at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpirationDecision {
    /// Fractional days until the due date; negative once past due.
    pub days_remaining: f64,
    pub tier: Tier,
}

impl ExpirationDecision {
    /// True when a notification is warranted.
    pub fn notifies(&self) -> bool {
        self.tier != Tier::None
    }

    /// True once the due instant has passed.
    pub fn is_past_due(&self) -> bool {
        self.days_remaining < 0.0
    }
}

/// Evaluate with the default policy.
pub fn evaluate(due_at: DateTime<Utc>, now: DateTime<Utc>) -> ExpirationDecision {
    ExpirationPolicy::default().evaluate(due_at, now)
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    to.signed_duration_since(from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 11, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_tiers_at_fixed_now() {
        let now = now();
        assert_eq!(evaluate(now + Duration::hours(12), now).tier, Tier::Urgent);
        assert_eq!(evaluate(now + Duration::days(5), now).tier, Tier::Reminder);
        assert_eq!(evaluate(now + Duration::days(30), now).tier, Tier::None);
        assert_eq!(evaluate(now - Duration::days(3), now).tier, Tier::None);
    }

    #[test]
    fn test_boundaries() {
        let policy = ExpirationPolicy::default();
        assert_eq!(policy.classify(7.0), Tier::Reminder);
        assert_eq!(policy.classify(7.01), Tier::None);
        assert_eq!(policy.classify(1.0), Tier::Urgent);
        assert_eq!(policy.classify(1.01), Tier::Reminder);
        assert_eq!(policy.classify(-0.5), Tier::Urgent);
        assert_eq!(policy.classify(-1.0), Tier::None);
    }

    #[test]
    fn test_days_remaining_is_fractional_and_signed() {
        let now = now();
        let decision = evaluate(now - Duration::hours(6), now);
        assert_eq!(decision.days_remaining, -0.25);
        assert!(decision.is_past_due());
        assert!(decision.notifies());
    }

    #[test]
    fn test_custom_policy() {
        let policy = ExpirationPolicy {
            reminder_days: 3.0,
            urgent_days: 0.5,
            grace_days: 0.5,
        };
        assert_eq!(policy.classify(5.0), Tier::None);
        assert_eq!(policy.classify(2.0), Tier::Reminder);
        assert_eq!(policy.classify(-0.6), Tier::None);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Urgent > Tier::Reminder);
        assert!(Tier::Reminder > Tier::None);
    }
}
