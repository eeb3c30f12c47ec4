//! Single-consumer tokio execution context for the [`Engine`].
//!
//! Inputs from the host and deduction ticks travel through the same
//! unbounded channel and are applied one at a time by one task, so no lock
//! guards the engine state. The ticker only holds a weak sender: once every
//! [`EngineHandle`] is dropped the channel closes and the task ends.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::{Engine, EngineConfig, EngineSnapshot, Flow, Input, TickSource};
use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::schedule::{Schedule, ScheduleEntry};
use crate::sink::{BalanceSink, BlockOverlay, NoopOverlay};

enum Message {
    Input(Input),
    Tick { generation: u64 },
    Subscribe(Box<dyn BalanceSink>),
    Unsubscribe,
    Snapshot(oneshot::Sender<EngineSnapshot>),
}

/// [`TickSource`] backed by a tokio interval that posts ticks onto the
/// engine's own queue.
pub struct TokioTicker {
    tx: mpsc::WeakUnboundedSender<Message>,
    task: Option<JoinHandle<()>>,
}

impl TokioTicker {
    fn new(tx: mpsc::WeakUnboundedSender<Message>) -> Self {
        Self { tx, task: None }
    }
}

impl TickSource for TokioTicker {
    fn start(&mut self, generation: u64, period: Duration) {
        self.cancel();
        let weak = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(tx) = weak.upgrade() else { break };
                if tx.send(Message::Tick { generation }).is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Cloneable sender side of a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl EngineHandle {
    pub fn send(&self, input: Input) -> Result<()> {
        self.post(Message::Input(input))
    }

    pub fn update_schedule(&self, schedule: Schedule) -> Result<()> {
        self.send(Input::UpdateSchedule {
            entries: schedule.entries().to_vec(),
        })
    }

    pub fn update_schedule_entries(&self, entries: Vec<ScheduleEntry>) -> Result<()> {
        self.send(Input::UpdateSchedule { entries })
    }

    pub fn update_block_list<I, S>(&self, apps: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(Input::UpdateBlockList {
            apps: apps.into_iter().map(Into::into).collect(),
        })
    }

    pub fn update_foreground_app(&self, app: Option<String>) -> Result<()> {
        self.send(Input::UpdateForegroundApp { app })
    }

    pub fn set_earned_balance(&self, milliseconds: u64) -> Result<()> {
        self.send(Input::SetEarnedBalance { milliseconds })
    }

    pub fn subscribe(&self, sink: impl BalanceSink + 'static) -> Result<()> {
        self.post(Message::Subscribe(Box::new(sink)))
    }

    pub fn unsubscribe(&self) -> Result<()> {
        self.post(Message::Unsubscribe)
    }

    /// Ask the engine to tear down and exit.
    pub fn stop(&self) -> Result<()> {
        self.send(Input::Stop)
    }

    /// Current state, observed after every message queued before this call.
    pub async fn snapshot(&self) -> Result<EngineSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.post(Message::Snapshot(reply))?;
        rx.await.map_err(|_| CoreError::EngineStopped)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn post(&self, msg: Message) -> Result<()> {
        self.tx.send(msg).map_err(|_| CoreError::EngineStopped)
    }
}

/// Assembles an [`Engine`] with its collaborators and spawns it.
pub struct EngineBuilder {
    config: EngineConfig,
    overlay: Box<dyn BlockOverlay>,
    clock: Arc<dyn Clock>,
    balance_sink: Option<Box<dyn BalanceSink>>,
    events: Option<mpsc::UnboundedSender<Event>>,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            overlay: Box::new(NoopOverlay),
            clock: Arc::new(SystemClock),
            balance_sink: None,
            events: None,
        }
    }

    pub fn overlay(mut self, overlay: impl BlockOverlay + 'static) -> Self {
        self.overlay = Box::new(overlay);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn balance_sink(mut self, sink: impl BalanceSink + 'static) -> Self {
        self.balance_sink = Some(Box::new(sink));
        self
    }

    /// Forward every recorded [`Event`] to `tx`.
    pub fn events(mut self, tx: mpsc::UnboundedSender<Event>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Spawn the engine task. Must be called within a tokio runtime.
    pub fn spawn(self) -> Result<(EngineHandle, JoinHandle<()>)> {
        self.config.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = TokioTicker::new(tx.downgrade());
        let mut engine = Engine::new(self.config, self.overlay, Box::new(ticker));
        if self.events.is_some() {
            engine.record_events();
        }
        if let Some(sink) = self.balance_sink {
            engine.subscribe(sink);
        }

        let task = tokio::spawn(run(engine, rx, self.clock, self.events));
        Ok((EngineHandle { tx }, task))
    }
}

async fn run(
    mut engine: Engine,
    mut rx: mpsc::UnboundedReceiver<Message>,
    clock: Arc<dyn Clock>,
    events: Option<mpsc::UnboundedSender<Event>>,
) {
    tracing::info!("engine started");
    while let Some(msg) = rx.recv().await {
        let now = clock.now();
        let flow = match msg {
            Message::Input(input) => engine.handle(input, now),
            Message::Tick { generation } => {
                engine.on_tick(generation, now);
                Flow::Continue
            }
            Message::Subscribe(sink) => {
                engine.subscribe(sink);
                Flow::Continue
            }
            Message::Unsubscribe => {
                engine.unsubscribe();
                Flow::Continue
            }
            Message::Snapshot(reply) => {
                let _ = reply.send(engine.snapshot());
                Flow::Continue
            }
        };

        for event in engine.take_events() {
            if let Some(tx) = &events {
                if tx.send(event).is_err() {
                    tracing::debug!("event listener dropped");
                }
            }
        }

        if flow == Flow::Shutdown {
            return;
        }
    }
    // Every handle dropped without an explicit stop.
    engine.shutdown(clock.now());
}
