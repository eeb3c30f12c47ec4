//! # Screentime Core Library
//!
//! Decides, moment to moment, whether the foreground application should be
//! blocked. Three inputs change asynchronously: a weekly schedule of blocking
//! windows, a set of blocked application identifiers, and an "earned screen
//! time" balance. A blocked app inside an active window either consumes the
//! balance at wall-clock rate or, once the balance is gone, is covered by the
//! host's lock overlay.
//!
//! ## Architecture
//!
//! - **Schedule matcher**: pure check of an instant against the first enabled
//!   entry for its weekday, overnight windows included
//! - **Block decision**: pure three-way outcome (`Allowed`, `Denied`, `Deducting`)
//! - **Engine**: owns the state, dispatches side effects from one `evaluate()`,
//!   and runs the one-second deduction session
//! - **Actor**: tokio task that serialises host inputs and ticks
//!
//! ## Key Components
//!
//! - [`Engine`]: synchronous state machine
//! - [`EngineBuilder`] / [`EngineHandle`]: spawned engine and its sender
//! - [`Schedule`]: weekly windows
//! - [`Config`]: TOML configuration

pub mod blocking;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod schedule;
pub mod sink;
pub mod storage;

pub use blocking::{decide, BlockList, Decision, EarnedBalance};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{
    Engine, EngineBuilder, EngineConfig, EngineHandle, EngineSnapshot, EngineState, Flow, Input,
    TickOutcome, TickSource,
};
pub use error::{ConfigError, CoreError, Result, ScheduleError, SinkError};
pub use events::Event;
pub use schedule::{is_within_active_window, Schedule, ScheduleEntry, TimeOfDay, Window};
pub use sink::{BalanceSink, BlockOverlay, NoopOverlay};
pub use storage::Config;
