use std::str::FromStr;

use chrono::{FixedOffset, Local, NaiveDateTime, Utc};
use thiserror::Error;

/// Timezone in which attendance days are bucketed and times-of-day recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceClock {
    /// Server-local time
    Local,
    Fixed(FixedOffset),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid attendance timezone `{0}`, expected `local`, `utc` or `±HH:MM`")]
pub struct InvalidClock(String);

impl AttendanceClock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            AttendanceClock::Local => Local::now().naive_local(),
            AttendanceClock::Fixed(offset) => Utc::now().with_timezone(offset).naive_local(),
        }
    }
}

impl FromStr for AttendanceClock {
    type Err = InvalidClock;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        let invalid = || InvalidClock(value.to_string());

        match value.to_ascii_lowercase().as_str() {
            "local" => return Ok(AttendanceClock::Local),
            "utc" | "z" => {
                let utc = FixedOffset::east_opt(0).ok_or_else(invalid)?;
                return Ok(AttendanceClock::Fixed(utc));
            }
            _ => {}
        }

        let (sign, rest) = match value.as_bytes().first() {
            Some(b'+') => (1, &value[1..]),
            Some(b'-') => (-1, &value[1..]),
            _ => return Err(invalid()),
        };
        let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
        let hours = two_digits(hours).ok_or_else(invalid)?;
        let minutes = two_digits(minutes).ok_or_else(invalid)?;
        if hours > 14 || minutes >= 60 {
            return Err(invalid());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(AttendanceClock::Fixed)
            .ok_or_else(invalid)
    }
}

/// Exactly two ASCII digits, no sign.
fn two_digits(s: &str) -> Option<i32> {
    match s.as_bytes() {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => {
            Some(i32::from(a - b'0') * 10 + i32::from(b - b'0'))
        }
        _ => None,
    }
}
