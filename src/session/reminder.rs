use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How often the user wants to be reminded to practice again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFrequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl ReminderFrequency {
    /// Interval between reminders
    pub fn interval(&self) -> Duration {
        match self {
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::days(7),
            Self::Biweekly => Duration::days(14),
            Self::Monthly => Duration::days(30),
        }
    }

    /// Next reminder time, counted from `now`
    pub fn next_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.interval()
    }
}
