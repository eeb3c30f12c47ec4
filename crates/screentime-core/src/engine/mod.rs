//! Evaluation-and-deduction engine.
//!
//! The engine is a synchronous state machine over three outcomes. It does not
//! own a thread: the caller feeds it inputs and ticks, always from one
//! execution context (see [`actor`] for the tokio one).
//!
//! ## Transitions
//!
//! ```text
//!              +-----------+
//!   input ---> | evaluate  | ---> Allowed    : stop deduction, hide overlay
//!   tick  ---> |           | ---> Denied     : stop deduction, show overlay
//!              +-----------+ ---> Deducting  : hide overlay, start deduction
//! ```
//!
//! Every side effect is driven from [`Engine::evaluate`], and every one of
//! them is idempotent, so evaluating twice in a row with no input change
//! issues nothing the second time.

pub mod actor;
mod deduction;
mod input;
mod state;

pub use actor::{EngineBuilder, EngineHandle};
pub use deduction::{DeductionController, DeductionSession, TickSource};
pub use input::Input;
pub use state::{EngineSnapshot, EngineState};

use std::time::Duration;

use chrono::NaiveDateTime;

use crate::blocking::{BlockList, Decision, EarnedBalance};
use crate::error::ConfigError;
use crate::events::Event;
use crate::schedule::Schedule;
use crate::sink::{BalanceSink, BlockOverlay};

/// Engine tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Deduction cadence. Each tick consumes exactly this much balance.
    pub tick_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "engine.tick_interval_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Whether the caller should keep feeding the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// Result of delivering a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belonged to a session that no longer exists.
    Stale,
    /// Deduction conditions no longer hold; the session was stopped.
    Disqualified,
    /// Balance was decremented and is still positive.
    Deducted { balance_ms: u64 },
    /// Balance just reached zero; the engine re-evaluated.
    Exhausted,
}

pub struct Engine {
    state: EngineState,
    deduction: DeductionController,
    overlay: Box<dyn BlockOverlay>,
    overlay_shown: bool,
    balance_sink: Option<Box<dyn BalanceSink>>,
    last_decision: Option<Decision>,
    /// `None` until [`Engine::record_events`] is called.
    events: Option<Vec<Event>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("deduction", &self.deduction)
            .field("overlay_shown", &self.overlay_shown)
            .field("subscribed", &self.balance_sink.is_some())
            .field("last_decision", &self.last_decision)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        overlay: Box<dyn BlockOverlay>,
        ticker: Box<dyn TickSource>,
    ) -> Self {
        Self {
            state: EngineState::default(),
            deduction: DeductionController::new(config.tick_interval, ticker),
            overlay,
            overlay_shown: false,
            balance_sink: None,
            last_decision: None,
            events: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn last_decision(&self) -> Option<&Decision> {
        self.last_decision.as_ref()
    }

    pub fn overlay_shown(&self) -> bool {
        self.overlay_shown
    }

    pub fn tracked_app(&self) -> Option<&str> {
        self.deduction.tracked_app()
    }

    pub fn session(&self) -> Option<&DeductionSession> {
        self.deduction.session()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            decision: self.last_decision.clone(),
            balance_ms: self.state.balance().as_millis(),
            foreground_app: self.state.foreground_app().map(str::to_owned),
            tracked_app: self.deduction.tracked_app().map(str::to_owned),
            overlay_shown: self.overlay_shown,
            schedule_entries: self.state.schedule().len(),
            blocked_apps: self.state.block_list().len(),
            blocked_hosts: self.state.blocked_hosts().len(),
        }
    }

    /// Start keeping a log of [`Event`]s. Off by default; whoever turns it
    /// on must drain it with [`Engine::take_events`].
    pub fn record_events(&mut self) {
        self.events.get_or_insert_with(Vec::new);
    }

    pub fn is_recording_events(&self) -> bool {
        self.events.is_some()
    }

    /// Drain the events recorded since the last call. Always empty when
    /// recording is off.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.as_mut().map(std::mem::take).unwrap_or_default()
    }

    // ── Observer ─────────────────────────────────────────────────────

    /// Install the balance observer, replacing any previous one.
    pub fn subscribe(&mut self, sink: Box<dyn BalanceSink>) {
        self.balance_sink = Some(sink);
    }

    /// Remove the balance observer. Returns whether one was installed.
    pub fn unsubscribe(&mut self) -> bool {
        self.balance_sink.take().is_some()
    }

    // ── Inputs ───────────────────────────────────────────────────────

    pub fn handle(&mut self, input: Input, now: NaiveDateTime) -> Flow {
        match input {
            Input::UpdateSchedule { entries } => {
                self.update_schedule(Schedule::new(entries), now);
            }
            Input::UpdateBlockList { apps } => {
                self.update_block_list(BlockList::new(apps), now);
            }
            Input::UpdateConfiguration {
                schedule,
                blocked_apps,
                blocked_hosts,
            } => {
                if let Some(entries) = schedule {
                    self.state.set_schedule(Schedule::new(entries));
                }
                if let Some(apps) = blocked_apps {
                    self.state.set_block_list(BlockList::new(apps));
                }
                if let Some(hosts) = blocked_hosts {
                    self.state.set_blocked_hosts(hosts);
                }
                tracing::debug!(
                    schedule_entries = self.state.schedule().len(),
                    blocked_apps = self.state.block_list().len(),
                    blocked_hosts = self.state.blocked_hosts().len(),
                    "configuration updated"
                );
                self.evaluate(now);
            }
            Input::UpdateForegroundApp { app } => {
                self.update_foreground_app(app, now);
            }
            Input::SetEarnedBalance { milliseconds } => {
                self.set_earned_balance(milliseconds, now);
            }
            Input::Start => {
                if self.state.is_configured() {
                    self.evaluate(now);
                } else {
                    tracing::info!("no configuration yet, waiting for update");
                }
            }
            Input::Stop => {
                self.shutdown(now);
                return Flow::Shutdown;
            }
        }
        Flow::Continue
    }

    pub fn update_schedule(&mut self, schedule: Schedule, now: NaiveDateTime) -> Decision {
        for (index, problem) in schedule.problems() {
            tracing::warn!(index, error = %problem, "schedule entry will never match");
        }
        tracing::debug!(entries = schedule.len(), "schedule updated");
        self.state.set_schedule(schedule);
        self.evaluate(now)
    }

    pub fn update_block_list(&mut self, block_list: BlockList, now: NaiveDateTime) -> Decision {
        tracing::debug!(apps = block_list.len(), "block list updated");
        self.state.set_block_list(block_list);
        self.evaluate(now)
    }

    /// Returns `None` when `app` equals the current foreground app; nothing
    /// is evaluated in that case.
    pub fn update_foreground_app(
        &mut self,
        app: Option<String>,
        now: NaiveDateTime,
    ) -> Option<Decision> {
        let previous = self.state.foreground_app().map(str::to_owned);
        if !self.state.set_foreground_app(app) {
            return None;
        }
        tracing::debug!(
            foreground = ?self.state.foreground_app(),
            previous = ?previous,
            "foreground app changed"
        );
        Some(self.evaluate(now))
    }

    pub fn set_earned_balance(&mut self, milliseconds: u64, now: NaiveDateTime) -> Decision {
        tracing::debug!(balance_ms = milliseconds, "earned balance set");
        self.state.set_balance(EarnedBalance::from_millis(milliseconds));
        self.emit_balance(now);
        self.evaluate(now)
    }

    /// Tear down any session. Used when the host service stops.
    pub fn shutdown(&mut self, now: NaiveDateTime) {
        self.stop_deduction(now);
        tracing::info!("engine shut down");
    }

    // ── Evaluation ───────────────────────────────────────────────────

    /// Recompute the decision for `now` and drive the side effects to match.
    pub fn evaluate(&mut self, now: NaiveDateTime) -> Decision {
        let decision = self.state.decide(now);
        tracing::debug!(
            foreground = ?self.state.foreground_app(),
            balance_ms = self.state.balance().as_millis(),
            decision = decision.label(),
            "evaluated"
        );

        match &decision {
            Decision::Allowed => {
                self.stop_deduction(now);
                self.set_overlay(false, now);
            }
            Decision::Denied(_) => {
                self.stop_deduction(now);
                self.set_overlay(true, now);
            }
            Decision::Deducting(app) => {
                self.set_overlay(false, now);
                self.start_deduction(app, now);
            }
        }

        if self.last_decision.as_ref() != Some(&decision) {
            tracing::info!(decision = decision.label(), app = ?decision.app(), "outcome changed");
            self.record(Event::OutcomeChanged {
                decision: decision.clone(),
                at: now,
            });
            self.last_decision = Some(decision.clone());
        }

        decision
    }

    /// Deliver a deduction tick scheduled for session `generation`.
    pub fn on_tick(&mut self, generation: u64, now: NaiveDateTime) -> TickOutcome {
        if !self.deduction.is_current(generation) {
            tracing::trace!(generation, "dropping stale tick");
            return TickOutcome::Stale;
        }
        let Some(tracked) = self.deduction.tracked_app().map(str::to_owned) else {
            return TickOutcome::Stale;
        };

        let fresh = self.state.decide(now);
        if self.state.foreground_app() != Some(tracked.as_str()) || !fresh.is_deducting_for(&tracked)
        {
            tracing::debug!(
                tracked = %tracked,
                foreground = ?self.state.foreground_app(),
                decision = fresh.label(),
                "deduction conditions no longer met"
            );
            self.stop_deduction(now);
            self.evaluate(now);
            return TickOutcome::Disqualified;
        }

        let period = self.deduction.period();
        let balance = self.state.balance_mut().deduct(period);
        tracing::debug!(app = %tracked, balance_ms = balance.as_millis(), "deducted");
        self.emit_balance(now);

        if balance.is_exhausted() {
            tracing::info!(app = %tracked, "earned balance exhausted");
            self.evaluate(now);
            return TickOutcome::Exhausted;
        }
        TickOutcome::Deducted {
            balance_ms: balance.as_millis(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn start_deduction(&mut self, app: &str, now: NaiveDateTime) {
        if self.deduction.tracked_app() == Some(app) {
            return;
        }
        // Switching apps: record the old session's end before the new start.
        self.stop_deduction(now);
        if !self.deduction.start(app) {
            return;
        }
        let balance_ms = self.state.balance().as_millis();
        tracing::info!(app, balance_ms, "deduction started");
        self.record(Event::DeductionStarted {
            app: app.to_string(),
            balance_ms,
            at: now,
        });
        self.emit_balance(now);
    }

    fn stop_deduction(&mut self, now: NaiveDateTime) {
        let Some(session) = self.deduction.stop() else {
            return;
        };
        let balance_ms = self.state.balance().as_millis();
        tracing::info!(app = %session.app, balance_ms, "deduction stopped");
        self.record(Event::DeductionStopped {
            app: session.app,
            balance_ms,
            at: now,
        });
    }

    fn set_overlay(&mut self, shown: bool, now: NaiveDateTime) {
        if self.overlay_shown == shown {
            return;
        }
        let result = if shown {
            self.overlay.show()
        } else {
            self.overlay.hide()
        };
        match result {
            Ok(()) => {
                self.overlay_shown = shown;
                self.record(if shown {
                    Event::OverlayShown { at: now }
                } else {
                    Event::OverlayHidden { at: now }
                });
            }
            Err(e) => {
                tracing::warn!(shown, error = %e, "overlay command failed");
            }
        }
    }

    fn record(&mut self, event: Event) {
        if let Some(log) = self.events.as_mut() {
            log.push(event);
        }
    }

    fn emit_balance(&mut self, now: NaiveDateTime) {
        let balance_ms = self.state.balance().as_millis();
        self.record(Event::BalanceUpdated { balance_ms, at: now });
        if let Some(sink) = self.balance_sink.as_mut() {
            if let Err(e) = sink.emit_balance(balance_ms) {
                tracing::warn!(balance_ms, error = %e, "failed to emit balance");
            }
        }
    }
}
