//! Block decision: combines block-list membership, the schedule window and the
//! earned balance into one of three outcomes.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;

/// Set of blocked application identifiers (opaque strings, e.g. package names).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockList(BTreeSet<String>);

impl BlockList {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, app: &str) -> bool {
        self.0.contains(app)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for BlockList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Remaining earned screen time in milliseconds. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EarnedBalance(u64);

impl EarnedBalance {
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    pub fn is_exhausted(self) -> bool {
        self.0 == 0
    }

    /// Consume `amount`, clamping at zero. Returns the new balance.
    pub fn deduct(&mut self, amount: Duration) -> Self {
        let ms = u64::try_from(amount.as_millis()).unwrap_or(u64::MAX);
        self.0 = self.0.saturating_sub(ms);
        *self
    }
}

/// Outcome of a block evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "app", rename_all = "snake_case")]
pub enum Decision {
    /// Nothing to block.
    Allowed,
    /// Blocked app in an active window with no balance left.
    Denied(String),
    /// Blocked app in an active window; balance is being consumed.
    Deducting(String),
}

impl Decision {
    pub fn app(&self) -> Option<&str> {
        match self {
            Decision::Allowed => None,
            Decision::Denied(app) | Decision::Deducting(app) => Some(app),
        }
    }

    pub fn is_deducting_for(&self, app: &str) -> bool {
        matches!(self, Decision::Deducting(a) if a == app)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allowed => "allowed",
            Decision::Denied(_) => "denied",
            Decision::Deducting(_) => "deducting",
        }
    }
}

/// Decide what should happen to `app` at `now`.
///
/// Pure: identical inputs at the same instant always give the same answer.
pub fn decide(
    app: Option<&str>,
    block_list: &BlockList,
    schedule: &Schedule,
    balance: EarnedBalance,
    now: NaiveDateTime,
) -> Decision {
    let Some(app) = app else {
        return Decision::Allowed;
    };

    let blocked = block_list.contains(app);
    if !blocked {
        return Decision::Allowed;
    }

    if !schedule.is_within_active_window(now) {
        return Decision::Allowed;
    }

    if balance.is_exhausted() {
        Decision::Denied(app.to_string())
    } else {
        Decision::Deducting(app.to_string())
    }
}
