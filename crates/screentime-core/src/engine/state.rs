use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::blocking::{decide, BlockList, Decision, EarnedBalance};
use crate::schedule::Schedule;

/// Aggregate in-memory configuration the decision is computed from.
///
/// Owned by exactly one [`Engine`](super::Engine); nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    schedule: Schedule,
    block_list: BlockList,
    /// Stored and reported, but not consulted by [`decide`].
    blocked_hosts: Vec<String>,
    foreground_app: Option<String>,
    balance: EarnedBalance,
}

impl EngineState {
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn block_list(&self) -> &BlockList {
        &self.block_list
    }

    pub fn blocked_hosts(&self) -> &[String] {
        &self.blocked_hosts
    }

    pub fn foreground_app(&self) -> Option<&str> {
        self.foreground_app.as_deref()
    }

    pub fn balance(&self) -> EarnedBalance {
        self.balance
    }

    /// True once the host has sent a schedule or a block list.
    pub fn is_configured(&self) -> bool {
        !self.schedule.is_empty() || !self.block_list.is_empty()
    }

    pub fn decide(&self, now: NaiveDateTime) -> Decision {
        decide(
            self.foreground_app.as_deref(),
            &self.block_list,
            &self.schedule,
            self.balance,
            now,
        )
    }

    pub(crate) fn set_schedule(&mut self, schedule: Schedule) {
        self.schedule = schedule;
    }

    pub(crate) fn set_block_list(&mut self, block_list: BlockList) {
        self.block_list = block_list;
    }

    pub(crate) fn set_blocked_hosts(&mut self, hosts: Vec<String>) {
        self.blocked_hosts = hosts;
    }

    /// Returns `false` when the value is unchanged.
    pub(crate) fn set_foreground_app(&mut self, app: Option<String>) -> bool {
        if self.foreground_app == app {
            return false;
        }
        self.foreground_app = app;
        true
    }

    pub(crate) fn set_balance(&mut self, balance: EarnedBalance) {
        self.balance = balance;
    }

    pub(crate) fn balance_mut(&mut self) -> &mut EarnedBalance {
        &mut self.balance
    }
}

/// Point-in-time view of the engine for hosts and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub decision: Option<Decision>,
    pub balance_ms: u64,
    pub foreground_app: Option<String>,
    pub tracked_app: Option<String>,
    pub overlay_shown: bool,
    pub schedule_entries: usize,
    pub blocked_apps: usize,
    pub blocked_hosts: usize,
}
