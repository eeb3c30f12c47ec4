use serde::{Deserialize, Serialize};

use crate::schedule::ScheduleEntry;

/// Inbound commands pushed by the host.
///
/// Every variant except `Stop` ends with an evaluation (`UpdateForegroundApp`
/// only when the app actually changed, `Start` only once configured).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    /// Replace the weekly schedule.
    UpdateSchedule { entries: Vec<ScheduleEntry> },
    /// Replace the set of blocked application identifiers.
    UpdateBlockList { apps: Vec<String> },
    /// Replace any of schedule, blocked apps and blocked hosts in one step.
    UpdateConfiguration {
        #[serde(default)]
        schedule: Option<Vec<ScheduleEntry>>,
        #[serde(default)]
        blocked_apps: Option<Vec<String>>,
        #[serde(default)]
        blocked_hosts: Option<Vec<String>>,
    },
    /// The visible application changed; `None` means unknown.
    UpdateForegroundApp {
        #[serde(default)]
        app: Option<String>,
    },
    /// Absolute overwrite of the earned balance.
    SetEarnedBalance { milliseconds: u64 },
    /// Host service started; evaluate if there is anything to evaluate.
    Start,
    /// Host service stopping; tear down and exit.
    Stop,
}
