pub mod check;
pub mod config;
pub mod run;
pub mod window;

use chrono::NaiveDateTime;
use screentime_core::{Clock, Schedule, ScheduleEntry, SystemClock};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Read schedule entries from inline JSON, or from a file when prefixed with `@`.
fn load_schedule(arg: &str) -> CliResult<Schedule> {
    let json = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read schedule file '{path}': {e}"))?,
        None => arg.to_string(),
    };
    let entries: Vec<ScheduleEntry> =
        serde_json::from_str(&json).map_err(|e| format!("invalid schedule JSON: {e}"))?;
    Ok(Schedule::new(entries))
}

/// Parse `--at`, falling back to the current local time.
fn parse_at(at: Option<&str>) -> CliResult<NaiveDateTime> {
    let Some(s) = at else {
        return Ok(SystemClock.now());
    };
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| format!("invalid --at '{s}': expected YYYY-MM-DDTHH:MM[:SS]").into())
}
