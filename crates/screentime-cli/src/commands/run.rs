//! Line-oriented host bridge: JSON `Input`s on stdin, JSON `Event`s on stdout.

use screentime_core::{BlockOverlay, Config, EngineBuilder, EngineConfig, Input, SinkError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::CliResult;

/// The terminal has no lock surface; overlay commands only show up in the
/// log and as events on stdout.
struct LoggingOverlay;

impl BlockOverlay for LoggingOverlay {
    fn show(&mut self) -> Result<(), SinkError> {
        tracing::info!("overlay: show");
        Ok(())
    }

    fn hide(&mut self) -> Result<(), SinkError> {
        tracing::info!("overlay: hide");
        Ok(())
    }
}

pub fn run(config: &Config) -> CliResult {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config.engine_config()))
}

async fn serve(engine_config: EngineConfig) -> CliResult {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let (handle, task) = EngineBuilder::new(engine_config)
        .overlay(LoggingOverlay)
        .events(events_tx)
        .spawn()?;

    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "failed to encode event"),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let input: Input = match serde_json::from_str(line) {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(error = %e, line, "ignoring malformed input");
                continue;
            }
        };
        let stop = matches!(input, Input::Stop);
        if handle.send(input).is_err() || stop {
            break;
        }
    }

    // EOF without an explicit stop still tears the session down.
    if !handle.is_closed() {
        let _ = handle.stop();
    }
    drop(handle);
    task.await?;
    printer.await?;
    Ok(())
}
