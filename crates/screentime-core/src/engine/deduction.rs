//! Deduction session bookkeeping.
//!
//! The controller owns at most one session and the tick source that drives
//! it. Every session gets a fresh generation number; ticks carry the
//! generation they were scheduled for, so a tick that was already in flight
//! when its session was stopped is recognised as stale and dropped.

use std::time::Duration;

/// Recurring tick producer.
///
/// `start` must deliver the first tick one `period` after it is called, not
/// immediately. `cancel` must be idempotent.
pub trait TickSource: Send {
    fn start(&mut self, generation: u64, period: Duration);
    fn cancel(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeductionSession {
    pub app: String,
    pub generation: u64,
}

pub struct DeductionController {
    session: Option<DeductionSession>,
    next_generation: u64,
    period: Duration,
    ticker: Box<dyn TickSource>,
}

impl std::fmt::Debug for DeductionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeductionController")
            .field("session", &self.session)
            .field("next_generation", &self.next_generation)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

impl DeductionController {
    pub fn new(period: Duration, ticker: Box<dyn TickSource>) -> Self {
        Self {
            session: None,
            next_generation: 1,
            period,
            ticker,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn session(&self) -> Option<&DeductionSession> {
        self.session.as_ref()
    }

    pub fn tracked_app(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.app.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Whether a tick tagged `generation` belongs to the live session.
    pub fn is_current(&self, generation: u64) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.generation == generation)
    }

    /// Begin deducting for `app`.
    ///
    /// Returns `false` without touching anything if a session for `app` is
    /// already running. A session for another app is torn down first.
    pub fn start(&mut self, app: &str) -> bool {
        if self.tracked_app() == Some(app) {
            return false;
        }
        self.stop();

        let generation = self.next_generation;
        self.next_generation += 1;
        self.session = Some(DeductionSession {
            app: app.to_string(),
            generation,
        });
        self.ticker.start(generation, self.period);
        true
    }

    /// End the live session, returning it. No-op when already stopped.
    pub fn stop(&mut self) -> Option<DeductionSession> {
        let session = self.session.take()?;
        self.ticker.cancel();
        Some(session)
    }
}
