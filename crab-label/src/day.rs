//! Day buckets and the effective-day rule
//!
//! A label started right before midnight must not jump to the next day's
//! sequence because of clock or keystroke lag, so timestamps strictly before
//! 00:01:00 local time belong to the previous calendar day.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Seconds after local midnight that still count as the previous day
pub const MIDNIGHT_GRACE_SECS: i64 = 60;

/// Shift a local wall-clock timestamp by the midnight rule
pub fn effective_day(now: NaiveDateTime) -> NaiveDateTime {
    let grace = Duration::seconds(MIDNIGHT_GRACE_SECS);
    if now.time() < NaiveTime::MIN + grace {
        now - grace
    } else {
        now
    }
}

/// One daily sequence bucket, ordered by `(year, day_of_year)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey {
    pub year: i32,
    pub day_of_year: u32,
}

impl DayKey {
    pub fn new(year: i32, day_of_year: u32) -> Self {
        Self { year, day_of_year }
    }

    /// Bucket of an already-effective timestamp
    pub fn from_datetime(effective: NaiveDateTime) -> Self {
        Self {
            year: effective.year(),
            day_of_year: effective.ordinal(),
        }
    }

    /// Bucket of a raw local timestamp (applies the midnight rule)
    pub fn for_timestamp(now: NaiveDateTime) -> Self {
        Self::from_datetime(effective_day(now))
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.day_of_year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid day key: {0}")]
pub struct ParseDayKeyError(String);

impl FromStr for DayKey {
    type Err = ParseDayKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDayKeyError(s.to_string());
        // rsplit keeps negative years intact
        let (year, doy) = s.rsplit_once('-').ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let day_of_year: u32 = doy.parse().map_err(|_| err())?;
        if !(1..=366).contains(&day_of_year) {
            return Err(err());
        }
        Ok(Self { year, day_of_year })
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of local wall-clock time
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Current time in a configured zone
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

/// A clock that always reads the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
