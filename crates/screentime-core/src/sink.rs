//! Outbound collaborators the engine drives.
//!
//! Both are fire-and-forget commands: the engine logs a returned error and
//! carries on, it never retries or propagates it.

use crate::error::SinkError;

/// Host surface that covers a blocked application.
///
/// `show` and `hide` must be idempotent.
pub trait BlockOverlay: Send {
    fn show(&mut self) -> Result<(), SinkError>;
    fn hide(&mut self) -> Result<(), SinkError>;
}

/// Observer for earned-balance changes.
pub trait BalanceSink: Send {
    fn emit_balance(&mut self, balance_ms: u64) -> Result<(), SinkError>;
}

impl<F> BalanceSink for F
where
    F: FnMut(u64) -> Result<(), SinkError> + Send,
{
    fn emit_balance(&mut self, balance_ms: u64) -> Result<(), SinkError> {
        self(balance_ms)
    }
}

/// Overlay that does nothing; for hosts without a lock surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOverlay;

impl BlockOverlay for NoopOverlay {
    fn show(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn hide(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
