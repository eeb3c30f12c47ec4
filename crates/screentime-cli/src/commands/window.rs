use chrono::Datelike;
use clap::Args;
use screentime_core::schedule::day_number;
use serde::Serialize;

use super::{load_schedule, parse_at, CliResult};

#[derive(Args)]
pub struct WindowArgs {
    /// Schedule entries as a JSON array, or @path to a JSON file
    #[arg(long)]
    schedule: String,
    /// Local instant to check (YYYY-MM-DDTHH:MM[:SS]); defaults to now
    #[arg(long)]
    at: Option<String>,
}

#[derive(Serialize)]
struct WindowReport {
    active: bool,
    day_of_week: u8,
}

pub fn run(args: WindowArgs) -> CliResult {
    let schedule = load_schedule(&args.schedule)?;
    let at = parse_at(args.at.as_deref())?;
    let report = WindowReport {
        active: schedule.is_within_active_window(at),
        day_of_week: day_number(at.weekday()),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
