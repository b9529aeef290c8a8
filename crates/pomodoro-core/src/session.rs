//! Session domain model.
//!
//! A [`Session`] is one timed interval; its lifecycle is a sequence of
//! [`SessionEvent`]s in an append-only log. The rows here serialize both to
//! the database (enum kinds as lowercase text, instants as unix seconds) and
//! to the hook payload (instants as RFC 3339 UTC with a trailing `Z`).

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The type of a pomodoro session: a focus interval or a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Focus,
    Break,
}

impl Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Focus => write!(f, "focus"),
            Self::Break => write!(f, "break"),
        }
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "focus" => Ok(Self::Focus),
            "break" => Ok(Self::Break),
            other => Err(format!("unknown session kind: {other}")),
        }
    }
}

/// A single timed pomodoro session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique, time-ordered identifier.
    pub id: Uuid,
    /// Whether this is a focus or break session.
    pub kind: SessionKind,
    /// Planned length in seconds; always positive.
    pub planned_secs: i64,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

/// One transition in a session's lifecycle.
///
/// `Started` must be the first event of every session. `Aborted` and
/// `Completed` are terminal: nothing may be appended after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionEventKind {
    /// The session began running.
    Started,
    /// A paused session resumed running.
    Resumed,
    /// A running session was paused; elapsed time stops accumulating.
    Paused,
    /// The session was cancelled before reaching its planned length.
    Aborted,
    /// The session reached its planned length.
    Completed,
}

impl SessionEventKind {
    /// Whether no further events may follow this one.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Aborted | Self::Completed)
    }
}

impl Display for SessionEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Resumed => write!(f, "resumed"),
            Self::Paused => write!(f, "paused"),
            Self::Aborted => write!(f, "aborted"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for SessionEventKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "started" => Ok(Self::Started),
            "resumed" => Ok(Self::Resumed),
            "paused" => Ok(Self::Paused),
            "aborted" => Ok(Self::Aborted),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown session event kind: {other}")),
        }
    }
}

/// An event recorded against a [`Session`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Unique, time-ordered identifier; strictly greater than the ids of all
    /// earlier events.
    pub id: Uuid,
    /// The transition this event records.
    pub kind: SessionEventKind,
    /// The session this event belongs to.
    pub session_id: Uuid,
    /// When the transition happened.
    pub created_at: DateTime<Utc>,
}

impl SessionEvent {
    pub fn new(
        id: Uuid,
        kind: SessionEventKind,
        session_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            session_id,
            created_at,
        }
    }
}
