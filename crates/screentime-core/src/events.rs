use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::blocking::Decision;

/// Every side effect the engine dispatches, as a record.
///
/// Only kept once `Engine::record_events` is on. The actor turns it on when
/// a listener is attached and forwards after every message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The evaluated outcome differs from the previous evaluation.
    OutcomeChanged {
        decision: Decision,
        at: NaiveDateTime,
    },
    OverlayShown {
        at: NaiveDateTime,
    },
    OverlayHidden {
        at: NaiveDateTime,
    },
    /// Current earned balance, sent on session start, every tick, and on set.
    BalanceUpdated {
        balance_ms: u64,
        at: NaiveDateTime,
    },
    DeductionStarted {
        app: String,
        balance_ms: u64,
        at: NaiveDateTime,
    },
    DeductionStopped {
        app: String,
        balance_ms: u64,
        at: NaiveDateTime,
    },
}
