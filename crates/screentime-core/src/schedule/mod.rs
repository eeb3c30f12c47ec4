//! Weekly blocking schedule and the window matcher.
//!
//! A schedule is an ordered list of per-day entries. For any instant only
//! the *first* enabled entry for that day of week is consulted, so insertion
//! order decides priority when several entries share a day.
//!
//! An overnight entry (e.g. Monday 22:00-02:00) is evaluated against its own
//! day only: it covers Monday 22:00-24:00 and Monday 00:00-02:00. The early
//! hours of Tuesday are governed by Tuesday's entry, never by Monday's.

mod time;

pub use time::{TimeOfDay, Window, WindowKind};

use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// One day-of-week scoped blocking window, in the shape delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    /// Monday = 1 ... Sunday = 7.
    pub day_of_week: u8,
    /// Missing means disabled.
    #[serde(default, alias = "enabled")]
    pub is_enabled: bool,
    /// `HH:MM`, 24-hour. Missing values decode as empty and never match.
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

impl ScheduleEntry {
    pub fn new(
        day_of_week: u8,
        is_enabled: bool,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            day_of_week,
            is_enabled,
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Parse the entry's times into a [`Window`].
    pub fn window(&self) -> Result<Window, ScheduleError> {
        let start = self.start_time.parse()?;
        let end = self.end_time.parse()?;
        Ok(Window::new(start, end))
    }

    /// Check everything a host could have gotten wrong.
    pub fn validate(&self) -> Result<Window, ScheduleError> {
        if !(1..=7).contains(&self.day_of_week) {
            return Err(ScheduleError::InvalidDay(self.day_of_week));
        }
        self.window()
    }

    fn applies_to(&self, day: u8) -> bool {
        self.is_enabled && self.day_of_week == day
    }
}

/// Ordered weekly schedule. Replaced wholesale on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First enabled entry for `day` (Monday = 1), if any.
    pub fn entry_for_day(&self, day: u8) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.applies_to(day))
    }

    /// Whether `now` falls inside the active window for its day of week.
    ///
    /// Malformed entries are logged and treated as inactive.
    pub fn is_within_active_window(&self, now: NaiveDateTime) -> bool {
        let day = day_number(now.weekday());

        let Some(entry) = self.entry_for_day(day) else {
            tracing::debug!(day, "no enabled schedule entry for today");
            return false;
        };

        let window = match entry.window() {
            Ok(window) => window,
            Err(e) => {
                tracing::warn!(
                    day,
                    start = %entry.start_time,
                    end = %entry.end_time,
                    error = %e,
                    "ignoring malformed schedule entry"
                );
                return false;
            }
        };

        let at = TimeOfDay::from_naive(now.time());
        let active = window.contains(at);
        tracing::debug!(day, %window, kind = ?window.kind(), %at, active, "schedule window checked");
        active
    }

    /// Validate every entry, returning each problem with its index.
    pub fn problems(&self) -> Vec<(usize, ScheduleError)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.validate().err().map(|err| (i, err)))
            .collect()
    }
}

impl From<Vec<ScheduleEntry>> for Schedule {
    fn from(entries: Vec<ScheduleEntry>) -> Self {
        Self::new(entries)
    }
}

/// Free-function form of [`Schedule::is_within_active_window`].
pub fn is_within_active_window(schedule: &Schedule, now: NaiveDateTime) -> bool {
    schedule.is_within_active_window(now)
}

/// Monday = 1 ... Sunday = 7.
pub fn day_number(day: Weekday) -> u8 {
    day.number_from_monday() as u8
}
