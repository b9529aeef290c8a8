//! Clock capability.
//!
//! The service and reducer never read the wall clock directly; they go
//! through [`Clock`] so tests can pin "now" to a known instant. All times
//! are UTC at second granularity, matching the stored event timestamps and
//! the rendered output.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Source of the current instant.
pub trait Clock {
    /// The current UTC time, truncated to whole seconds.
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

/// A clock pinned to a settable instant, for tests.
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and advance time while the service holds another.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl FixedClock {
    /// A clock frozen at `instant`.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(instant.trunc_subsecs(0))),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.now.set(instant.trunc_subsecs(0));
    }

    /// Advance the clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
