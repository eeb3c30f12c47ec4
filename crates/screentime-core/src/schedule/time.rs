use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock time of day with minute resolution, parsed from `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::MalformedTime {
                value: format!("{hour}:{minute}"),
            });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes elapsed since midnight (0..1440).
    pub fn minutes_since_midnight(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    /// Truncates a clock reading to the minute it falls in.
    ///
    /// Window boundaries sit on whole minutes, so comparing truncated minutes
    /// gives the same answer as comparing full timestamps.
    pub fn from_naive(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ScheduleError::MalformedTime {
            value: s.to_string(),
        };

        let mut parts = s.split(':');
        let (Some(h), Some(m), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        let hour: u8 = h.parse().map_err(|_| malformed())?;
        let minute: u8 = m.parse().map_err(|_| malformed())?;
        Self::new(hour, minute).map_err(|_| malformed())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Shape of a daily window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// `start < end`, contained within one calendar day.
    SameDay,
    /// `end <= start`, wraps past midnight.
    Overnight,
}

/// A parsed `[start, end)` window within a day.
///
/// Overnight windows are the union `[start, 24:00) ∪ [00:00, end)`, so an
/// entry with `start == end` covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl Window {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn kind(&self) -> WindowKind {
        if self.end > self.start {
            WindowKind::SameDay
        } else {
            WindowKind::Overnight
        }
    }

    /// Start-inclusive, end-exclusive membership test.
    pub fn contains(&self, at: TimeOfDay) -> bool {
        match self.kind() {
            WindowKind::SameDay => self.start <= at && at < self.end,
            WindowKind::Overnight => at >= self.start || at < self.end,
        }
    }

    /// Length of the window in minutes.
    pub fn duration_minutes(&self) -> u16 {
        let start = self.start.minutes_since_midnight();
        let end = self.end.minutes_since_midnight();
        match self.kind() {
            WindowKind::SameDay => end - start,
            WindowKind::Overnight => MINUTES_PER_DAY - start + end,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
