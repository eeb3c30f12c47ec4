//! Integration tests for the evaluation-and-deduction engine.
//!
//! Ticks are delivered by hand, so every test controls exactly when the
//! balance moves.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use screentime_core::{
    BlockList, BlockOverlay, Decision, Engine, EngineConfig, Event, Input, Schedule,
    ScheduleEntry, SinkError, TickOutcome, TickSource,
};

const GAME: &str = "com.example.game";
const VIDEO: &str = "com.example.video";

/// Remembers the generation it was last started with.
#[derive(Clone, Default)]
struct ManualTicker {
    active: Arc<Mutex<Option<u64>>>,
    starts: Arc<Mutex<u32>>,
}

impl TickSource for ManualTicker {
    fn start(&mut self, generation: u64, _period: Duration) {
        *self.active.lock().unwrap() = Some(generation);
        *self.starts.lock().unwrap() += 1;
    }

    fn cancel(&mut self) {
        *self.active.lock().unwrap() = None;
    }
}

#[derive(Clone, Default)]
struct Overlay {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl BlockOverlay for Overlay {
    fn show(&mut self) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push("show");
        Ok(())
    }

    fn hide(&mut self) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push("hide");
        Ok(())
    }
}

struct Harness {
    engine: Engine,
    ticker: ManualTicker,
    overlay: Overlay,
    balances: Arc<Mutex<Vec<u64>>>,
}

impl Harness {
    fn new() -> Self {
        let ticker = ManualTicker::default();
        let overlay = Overlay::default();
        let mut engine = Engine::new(
            EngineConfig::default(),
            Box::new(overlay.clone()),
            Box::new(ticker.clone()),
        );
        engine.record_events();
        let balances = Arc::new(Mutex::new(Vec::new()));
        let sink = balances.clone();
        engine.subscribe(Box::new(move |ms: u64| -> Result<(), SinkError> {
            sink.lock().unwrap().push(ms);
            Ok(())
        }));
        Self {
            engine,
            ticker,
            overlay,
            balances,
        }
    }

    /// Monday 22:00-02:00 schedule, `GAME` blocked, `balance_ms` earned.
    fn scenario(balance_ms: u64) -> Self {
        let mut h = Self::new();
        let now = monday(23, 0);
        h.engine.update_schedule(
            Schedule::new(vec![ScheduleEntry::new(1, true, "22:00", "02:00")]),
            now,
        );
        h.engine.update_block_list(BlockList::new([GAME]), now);
        h.engine.set_earned_balance(balance_ms, now);
        h.balances.lock().unwrap().clear();
        h.engine.take_events();
        h
    }

    /// Deliver a tick for whatever session the ticker believes is live.
    fn tick(&mut self, now: NaiveDateTime) -> Option<TickOutcome> {
        let generation = (*self.ticker.active.lock().unwrap())?;
        Some(self.engine.on_tick(generation, now))
    }

    fn balances(&self) -> Vec<u64> {
        self.balances.lock().unwrap().clone()
    }

    fn overlay_calls(&self) -> Vec<&'static str> {
        self.overlay.calls.lock().unwrap().clone()
    }
}

/// 2024-01-01 was a Monday.
fn monday(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

#[test]
fn scenario_balance_runs_out_and_app_is_denied() {
    let mut h = Harness::scenario(5000);
    let now = monday(23, 0);

    let decision = h.engine.update_foreground_app(Some(GAME.into()), now);
    assert_eq!(decision, Some(Decision::Deducting(GAME.into())));
    // Initial snapshot on session start.
    assert_eq!(h.balances(), vec![5000]);

    for _ in 0..4 {
        assert!(matches!(h.tick(now), Some(TickOutcome::Deducted { .. })));
    }
    assert_eq!(h.tick(now), Some(TickOutcome::Exhausted));

    assert_eq!(h.engine.state().balance().as_millis(), 0);
    assert_eq!(h.balances(), vec![5000, 4000, 3000, 2000, 1000, 0]);
    assert_eq!(h.engine.last_decision(), Some(&Decision::Denied(GAME.into())));
    assert!(h.engine.overlay_shown());
    assert_eq!(h.overlay_calls(), vec!["show"]);
    assert_eq!(h.engine.tracked_app(), None);
    // Ticker was cancelled, so there is nothing left to deliver.
    assert_eq!(h.tick(now), None);
}

#[test]
fn scenario_empty_schedule_always_allows() {
    let mut h = Harness::new();
    let now = monday(23, 0);
    h.engine.update_block_list(BlockList::new([GAME]), now);
    h.engine.set_earned_balance(0, now);
    let decision = h.engine.update_foreground_app(Some(GAME.into()), now);
    assert_eq!(decision, Some(Decision::Allowed));
    assert!(!h.engine.overlay_shown());
    assert_eq!(*h.ticker.starts.lock().unwrap(), 0);
}

#[test]
fn scenario_foreground_cleared_mid_deduction() {
    let mut h = Harness::scenario(5000);
    let now = monday(23, 0);
    h.engine.update_foreground_app(Some(GAME.into()), now);
    h.tick(now);
    let generation = h.engine.session().unwrap().generation;

    let decision = h.engine.update_foreground_app(None, now);
    assert_eq!(decision, Some(Decision::Allowed));
    assert_eq!(h.engine.tracked_app(), None);
    assert!(!h.engine.overlay_shown());

    // An in-flight tick from the cancelled session must not emit.
    let before = h.balances();
    assert_eq!(h.engine.on_tick(generation, now), TickOutcome::Stale);
    assert_eq!(h.balances(), before);
    assert_eq!(h.engine.state().balance().as_millis(), 4000);
}

#[test]
fn scenario_block_list_drops_deducting_app() {
    let mut h = Harness::scenario(5000);
    let now = monday(23, 0);
    h.engine.update_foreground_app(Some(GAME.into()), now);
    let generation = h.engine.session().unwrap().generation;

    h.engine.update_block_list(BlockList::new([VIDEO]), now);
    assert_eq!(h.engine.last_decision(), Some(&Decision::Allowed));
    assert_eq!(h.engine.tracked_app(), None);
    assert_eq!(h.engine.on_tick(generation, now), TickOutcome::Stale);
    assert_eq!(h.engine.state().balance().as_millis(), 5000);
}

#[test]
fn tick_after_window_closes_stops_and_reevaluates() {
    let mut h = Harness::scenario(60_000);
    h.engine.update_foreground_app(Some(GAME.into()), monday(1, 58));
    assert_eq!(h.tick(monday(1, 59)), Some(TickOutcome::Deducted { balance_ms: 59_000 }));
    assert_eq!(h.tick(monday(2, 0)), Some(TickOutcome::Disqualified));
    assert_eq!(h.engine.last_decision(), Some(&Decision::Allowed));
    assert_eq!(h.engine.state().balance().as_millis(), 59_000);
}

#[test]
fn switching_between_blocked_apps_keeps_one_session() {
    let mut h = Harness::scenario(10_000);
    let now = monday(23, 0);
    h.engine
        .update_block_list(BlockList::new([GAME, VIDEO]), now);

    h.engine.update_foreground_app(Some(GAME.into()), now);
    let first = h.engine.session().unwrap().generation;
    h.engine.update_foreground_app(Some(VIDEO.into()), now);
    let second = h.engine.session().unwrap().generation;

    assert_ne!(first, second);
    assert_eq!(h.engine.tracked_app(), Some(VIDEO));
    assert_eq!(h.engine.on_tick(first, now), TickOutcome::Stale);
    assert_eq!(
        h.engine.on_tick(second, now),
        TickOutcome::Deducted { balance_ms: 9000 }
    );

    let events = h.engine.take_events();
    let started = events
        .iter()
        .filter(|e| matches!(e, Event::DeductionStarted { .. }))
        .count();
    let stopped = events
        .iter()
        .filter(|e| matches!(e, Event::DeductionStopped { .. }))
        .count();
    assert_eq!(started, 2);
    assert_eq!(stopped, 1);
}

#[test]
fn repeated_evaluation_issues_no_side_effects() {
    let mut h = Harness::scenario(5000);
    let now = monday(23, 0);
    h.engine.update_foreground_app(Some(GAME.into()), now);
    let starts = *h.ticker.starts.lock().unwrap();
    let balances = h.balances();
    h.engine.take_events();

    assert_eq!(h.engine.evaluate(now), Decision::Deducting(GAME.into()));
    assert_eq!(h.engine.evaluate(now), Decision::Deducting(GAME.into()));

    assert_eq!(*h.ticker.starts.lock().unwrap(), starts);
    assert_eq!(h.balances(), balances);
    assert!(h.overlay_calls().is_empty());
    assert!(h.engine.take_events().is_empty());
}

#[test]
fn topping_up_balance_lifts_denial() {
    let mut h = Harness::scenario(0);
    let now = monday(23, 0);
    h.engine.update_foreground_app(Some(GAME.into()), now);
    assert!(h.engine.overlay_shown());

    let decision = h.engine.set_earned_balance(3000, now);
    assert_eq!(decision, Decision::Deducting(GAME.into()));
    assert!(!h.engine.overlay_shown());
    assert_eq!(h.overlay_calls(), vec!["show", "hide"]);
    // Echo of the new balance, then the session's initial snapshot.
    assert_eq!(h.balances(), vec![3000, 3000]);
}

#[test]
fn unsubscribed_sink_receives_nothing() {
    let mut h = Harness::scenario(5000);
    let now = monday(23, 0);
    h.engine.update_foreground_app(Some(GAME.into()), now);
    assert!(h.engine.unsubscribe());
    h.tick(now);
    h.tick(now);
    assert_eq!(h.balances(), vec![5000]);
    assert_eq!(h.engine.state().balance().as_millis(), 3000);
}

#[test]
fn inputs_drive_the_same_paths_as_methods() {
    let mut h = Harness::new();
    let now = monday(23, 0);
    let inputs = [
        Input::UpdateConfiguration {
            schedule: Some(vec![ScheduleEntry::new(1, true, "22:00", "02:00")]),
            blocked_apps: Some(vec![GAME.into()]),
            blocked_hosts: Some(vec!["example.com".into()]),
        },
        Input::SetEarnedBalance { milliseconds: 2000 },
        Input::UpdateForegroundApp {
            app: Some(GAME.into()),
        },
    ];
    for input in inputs {
        h.engine.handle(input, now);
    }
    assert_eq!(h.engine.last_decision(), Some(&Decision::Deducting(GAME.into())));
    assert_eq!(h.engine.snapshot().blocked_hosts, 1);
}

#[test]
fn events_record_outcome_changes_in_order() {
    let mut h = Harness::scenario(1000);
    let now = monday(23, 0);
    h.engine.update_foreground_app(Some(GAME.into()), now);
    h.tick(now);

    let kinds: Vec<&'static str> = h
        .engine
        .take_events()
        .iter()
        .map(|e| match e {
            Event::OutcomeChanged { .. } => "outcome",
            Event::OverlayShown { .. } => "shown",
            Event::OverlayHidden { .. } => "hidden",
            Event::BalanceUpdated { .. } => "balance",
            Event::DeductionStarted { .. } => "started",
            Event::DeductionStopped { .. } => "stopped",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["started", "balance", "outcome", "balance", "stopped", "shown", "outcome"]
    );
}

#[test]
fn undrained_engine_keeps_no_event_log() {
    let mut engine = Engine::new(
        EngineConfig::default(),
        Box::new(Overlay::default()),
        Box::new(ManualTicker::default()),
    );
    let now = monday(23, 0);
    engine.update_schedule(
        Schedule::new(vec![ScheduleEntry::new(1, true, "22:00", "02:00")]),
        now,
    );
    engine.update_block_list(BlockList::new([GAME]), now);
    engine.set_earned_balance(200_000_000, now);
    engine.update_foreground_app(Some(GAME.into()), now);
    let generation = engine.session().unwrap().generation;

    for _ in 0..100_000 {
        engine.on_tick(generation, now);
    }
    assert_eq!(engine.state().balance().as_millis(), 100_000_000);
    assert!(engine.take_events().is_empty());

    engine.record_events();
    engine.on_tick(generation, now);
    assert_eq!(engine.take_events().len(), 1);
    assert!(engine.take_events().is_empty());
}
