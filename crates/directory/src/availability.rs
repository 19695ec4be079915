//! The advisory 24 hour window between account creation and first use.

use std::fmt;

use chrono::{DateTime, Utc};

/// Length of the pending window after creation.
pub const PENDING_WINDOW_SECS: i64 = 86_400;

/// How soon a freshly created account can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// The directory reported no creation time.
    NotProvisioned,
    Ready,
    Pending { hours: i64, minutes: i64 },
}

impl Availability {
    pub fn at(creation_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(created) = creation_time else {
            return Self::NotProvisioned;
        };

        let remaining = PENDING_WINDOW_SECS - (now - created).num_seconds();
        if remaining <= 0 {
            return Self::Ready;
        }

        let hours = remaining / 3600;
        let mut minutes = (remaining % 3600) / 60;
        if hours == 0 {
            minutes = minutes.max(1);
        }
        Self::Pending { hours, minutes }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NotProvisioned => f.write_str("Account Not Provisioned"),
            Self::Ready => f.write_str("Account is Ready"),
            Self::Pending { hours, minutes } => match (hours, minutes) {
                (0, m) => f.write_str(&plural(m, "minute")),
                (h, 0) => f.write_str(&plural(h, "hour")),
                (h, m) => write!(f, "{} and {}", plural(h, "hour"), plural(m, "minute")),
            },
        }
    }
}
