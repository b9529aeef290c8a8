//! Invocation context.
//!
//! One value, built by the CLI front end and threaded to the service,
//! carrying everything a command needs besides the store: configuration,
//! the clock, the id generator, and the hook dispatcher. Tests swap in a
//! [`FixedClock`](crate::clock::FixedClock) or drop the hooks; nothing
//! reaches for process-wide state.

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::hooks::HookDispatcher;
use crate::id::IdGenerator;

/// Capabilities shared by every command in one invocation.
pub struct Context {
    pub config: Config,
    pub clock: Box<dyn Clock>,
    pub ids: IdGenerator,
    /// `None` disables hook dispatch for this invocation.
    pub hooks: Option<HookDispatcher>,
}

impl Context {
    /// The production wiring: system clock, fresh id generator, hooks under
    /// the configuration directory.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clock: Box::new(SystemClock),
            ids: IdGenerator::new(),
            hooks: Some(HookDispatcher::from_config_dir()),
        }
    }
}
