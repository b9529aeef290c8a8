//! # Pomodoro Core Library
//!
//! Core business logic for the `pomodoro` CLI: an event-sourced Pomodoro
//! timer whose session state is reconstructed from an append-only log on
//! every invocation.
//!
//! ## Architecture
//!
//! - **Session model**: sessions (`focus` / `break`) and the lifecycle
//!   events recorded against them
//! - **Storage**: SQLite-backed append-only store for sessions and events
//! - **Reducer**: a total fold of one session's event log into a derived
//!   state (running / paused / completed / aborted)
//! - **Service**: the state machine enforcing which transitions are legal
//! - **Renderer**: text / JSON / user-template projections of the derived
//!   state
//! - **Hooks**: user executables invoked on state transitions with a JSON
//!   payload on stdin
//!
//! There is no daemon and no internal thread: every command is a short-lived
//! process that replays the log, decides one transition, and appends at most
//! one event.

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod id;
pub mod reducer;
pub mod render;
pub mod service;
pub mod session;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use context::Context;
pub use error::{ConfigError, CoreError, StoreError};
pub use hooks::{HookDispatcher, HookPayload};
pub use id::IdGenerator;
pub use reducer::{reduce, DerivedKind, DerivedState, Reduction, SessionState};
pub use render::{render_json, render_text, DEFAULT_TEXT_TEMPLATE};
pub use service::{SessionService, StartOutcome, StopOutcome};
pub use session::{Session, SessionEvent, SessionEventKind, SessionKind};
pub use storage::{Database, Store};
