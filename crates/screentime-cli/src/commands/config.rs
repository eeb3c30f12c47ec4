use clap::Subcommand;
use screentime_core::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dotted key
    Get {
        /// `engine.tick_interval_ms` (deduction cadence, ms) or `logging.filter`
        key: String,
    },
    /// Change one value; checked against the existing type, then saved
    Set {
        /// `engine.tick_interval_ms` or `logging.filter`
        key: String,
        /// New value (`tick_interval_ms` must be greater than zero)
        value: String,
    },
    /// Print every value as `section.key = value`
    List,
    /// Print the location of the config file
    Path,
    /// Overwrite the config file with defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            tracing::info!(%key, %value, "config updated");
            println!("ok");
        }
        ConfigAction::List => {
            for (key, value) in Config::load()?.entries() {
                println!("{key} = {value}");
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults at {}", Config::path()?.display());
        }
    }
    Ok(())
}
