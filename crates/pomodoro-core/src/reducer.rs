//! State reducer.
//!
//! Folds one session's event log into a [`DerivedState`]: the only view of
//! "what is happening right now" the rest of the system works with. The
//! fold is total. Any log the store can hold produces a well-formed state,
//! and malformed intervals clamp to zero rather than fail.
//!
//! Elapsed time is the sum of the running intervals: `started`/`resumed`
//! anchor the start of a run, `paused` and the terminal events close it.
//! A still-open run is extended to `now`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionEvent, SessionEventKind, SessionKind};

/// The session kind as seen by the status surface, including the empty
/// store case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedKind {
    None,
    Focus,
    Break,
}

impl From<SessionKind> for DerivedKind {
    fn from(kind: SessionKind) -> Self {
        match kind {
            SessionKind::Focus => Self::Focus,
            SessionKind::Break => Self::Break,
        }
    }
}

impl std::fmt::Display for DerivedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Focus => write!(f, "focus"),
            Self::Break => write!(f, "break"),
        }
    }
}

/// The lifecycle state of the most recent session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No session exists yet.
    #[default]
    None,
    /// The session is actively counting down.
    Running,
    /// The session has been paused by the user.
    Paused,
    /// The session reached its planned duration.
    Completed,
    /// The session was cancelled before finishing.
    Aborted,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// The computed view of the latest session. Never persisted; recomputed
/// from the event log on every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedState {
    pub kind: DerivedKind,
    pub state: SessionState,
    pub planned_secs: u64,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
}

impl DerivedState {
    /// The empty-store view: everything `none`, all counters zero.
    pub fn none() -> Self {
        Self {
            kind: DerivedKind::None,
            state: SessionState::None,
            planned_secs: 0,
            elapsed_secs: 0,
            remaining_secs: 0,
        }
    }
}

/// A reduction result: the renderable view plus the instant a running
/// session runs out of planned time, which the service needs to stamp
/// auto-completion deterministically.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub view: DerivedState,
    /// Set iff the session is running (including running past its planned
    /// length).
    pub expires_at: Option<DateTime<Utc>>,
}

/// Fold `events` (ascending id order) for `session` into a [`Reduction`]
/// as of `now`.
pub fn reduce(
    session: Option<&Session>,
    events: &[SessionEvent],
    now: DateTime<Utc>,
) -> Reduction {
    let Some(session) = session else {
        return Reduction {
            view: DerivedState::none(),
            expires_at: None,
        };
    };

    let mut elapsed: i64 = 0;
    let mut run_start: Option<DateTime<Utc>> = None;
    let mut terminal: Option<SessionState> = None;

    for event in events {
        match event.kind {
            SessionEventKind::Started | SessionEventKind::Resumed => {
                run_start = Some(event.created_at);
            }
            SessionEventKind::Paused => {
                if let Some(since) = run_start.take() {
                    elapsed += seconds_between(since, event.created_at);
                }
            }
            SessionEventKind::Aborted | SessionEventKind::Completed => {
                if let Some(since) = run_start.take() {
                    elapsed += seconds_between(since, event.created_at);
                }
                terminal = Some(if event.kind == SessionEventKind::Completed {
                    SessionState::Completed
                } else {
                    SessionState::Aborted
                });
                break;
            }
        }
    }

    let planned = session.planned_secs.max(0);
    let (state, elapsed, expires_at) = match (terminal, run_start) {
        (Some(SessionState::Completed), _) => (SessionState::Completed, elapsed.min(planned), None),
        (Some(state), _) => (state, elapsed, None),
        (None, Some(since)) => {
            // The run is still open; it exhausts the planned time at a
            // fixed instant regardless of when anyone looks.
            let expires_at = since + Duration::seconds((planned - elapsed).max(0));
            let provisional = elapsed + seconds_between(since, now);
            (
                SessionState::Running,
                provisional.min(planned),
                Some(expires_at),
            )
        }
        (None, None) => (SessionState::Paused, elapsed, None),
    };

    let remaining = (planned - elapsed).max(0);
    Reduction {
        view: DerivedState {
            kind: session.kind.into(),
            state,
            planned_secs: planned as u64,
            elapsed_secs: elapsed.max(0) as u64,
            remaining_secs: remaining as u64,
        },
        expires_at,
    }
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().max(0)
}
