use clap::Args;
use screentime_core::{decide, BlockList, EarnedBalance};

use super::{load_schedule, parse_at, CliResult};

#[derive(Args)]
pub struct CheckArgs {
    /// Schedule entries as a JSON array, or @path to a JSON file
    #[arg(long)]
    schedule: String,
    /// Blocked application identifiers, comma separated
    #[arg(long, value_delimiter = ',')]
    blocked: Vec<String>,
    /// Foreground application identifier; omit for "unknown"
    #[arg(long)]
    app: Option<String>,
    /// Earned balance in milliseconds
    #[arg(long, default_value_t = 0)]
    balance: u64,
    /// Local instant to check (YYYY-MM-DDTHH:MM[:SS]); defaults to now
    #[arg(long)]
    at: Option<String>,
}

pub fn run(args: CheckArgs) -> CliResult {
    let schedule = load_schedule(&args.schedule)?;
    let at = parse_at(args.at.as_deref())?;
    let block_list: BlockList = args
        .blocked
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let decision = decide(
        args.app.as_deref(),
        &block_list,
        &schedule,
        EarnedBalance::from_millis(args.balance),
        at,
    );
    println!("{}", serde_json::to_string(&decision)?);
    Ok(())
}
