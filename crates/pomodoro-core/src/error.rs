//! Core error types for pomodoro-core.
//!
//! The taxonomy follows how errors surface to the user: state conflicts and
//! store failures are reported and fail the command, parse-class errors
//! (durations, templates, arguments) are usage mistakes, and hook failures
//! never appear here at all because the dispatcher swallows them.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionKind;

/// Core error type for pomodoro-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A new session was requested while a different kind is in progress.
    #[error("cannot start {requested}; a {current} session is already in progress")]
    StartConflict {
        requested: SessionKind,
        current: SessionKind,
    },

    /// A paused session of a different kind blocks the requested resume.
    #[error("cannot resume {requested}; a {current} session is paused")]
    ResumeConflict {
        requested: SessionKind,
        current: SessionKind,
    },

    /// The requested session length rounds down to zero seconds.
    #[error("session duration must be positive")]
    EmptyDuration,

    /// An argument combination the parser cannot reject on its own.
    #[error("{0}")]
    InvalidArgument(String),

    /// Database-related errors
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Status template compilation or rendering failed.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether this error is a usage/parse mistake rather than a runtime
    /// failure. The CLI maps these to a distinct exit code.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            CoreError::EmptyDuration | CoreError::InvalidArgument(_) | CoreError::Template(_)
        )
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to create the directory holding the database file
    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No session row exists for the given id
    #[error("session {0} not found")]
    SessionNotFound(uuid::Uuid),

    /// Database is locked by a concurrent invocation
    #[error("database is locked")]
    Locked,

    /// Migration failed
    #[error("database migration failed: {0}")]
    Migration(String),

    /// Query execution failed
    #[error("query failed: {0}")]
    Query(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::Query(err.to_string())
                }
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
