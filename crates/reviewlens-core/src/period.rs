use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Review window selector accepted by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewPeriod {
    Day,
    Days30,
    Days60,
    Days90,
    Year,
    All,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid review period \"{0}\": expected one of 1, 30, 60, 90, 365, all")]
pub struct InvalidPeriod(pub String);

impl ReviewPeriod {
    /// Window length in days; `None` for [`ReviewPeriod::All`].
    #[must_use]
    pub fn days(self) -> Option<i64> {
        match self {
            ReviewPeriod::Day => Some(1),
            ReviewPeriod::Days30 => Some(30),
            ReviewPeriod::Days60 => Some(60),
            ReviewPeriod::Days90 => Some(90),
            ReviewPeriod::Year => Some(365),
            ReviewPeriod::All => None,
        }
    }

    /// Oldest instant a review may carry and still fall inside the window.
    #[must_use]
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|days| now - Duration::days(days))
    }

    /// Unix-seconds form of [`ReviewPeriod::cutoff`].
    #[must_use]
    pub fn cutoff_unix(self, now: DateTime<Utc>) -> Option<i64> {
        self.cutoff(now).map(|c| c.timestamp())
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewPeriod::Day => "1",
            ReviewPeriod::Days30 => "30",
            ReviewPeriod::Days60 => "60",
            ReviewPeriod::Days90 => "90",
            ReviewPeriod::Year => "365",
            ReviewPeriod::All => "all",
        }
    }
}

impl FromStr for ReviewPeriod {
    type Err = InvalidPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" => Ok(ReviewPeriod::Day),
            "30" => Ok(ReviewPeriod::Days30),
            "60" => Ok(ReviewPeriod::Days60),
            "90" => Ok(ReviewPeriod::Days90),
            "365" => Ok(ReviewPeriod::Year),
            "all" => Ok(ReviewPeriod::All),
            _ => Err(InvalidPeriod(s.to_owned())),
        }
    }
}

impl std::fmt::Display for ReviewPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReviewPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
