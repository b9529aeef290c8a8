//! SQLite-based session and event storage.
//!
//! Two tables, both append-only: `session` and `session_event`. Rows are
//! never updated in place; the event log is the single source of truth and
//! the reducer recomputes state from it on every invocation.
//!
//! Ids are stored as hyphenated UUID text, so `ORDER BY ... DESC` on the
//! primary key returns newest-first. Instants are stored as unix seconds.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

use super::data_dir;
use crate::error::StoreError;
use crate::session::{Session, SessionEvent};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS session (
        session_id   TEXT PRIMARY KEY,
        session_kind TEXT NOT NULL,
        planned_secs INTEGER NOT NULL CHECK (planned_secs > 0),
        created_at   INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS session_event (
        session_event_id   TEXT PRIMARY KEY,
        session_event_kind TEXT NOT NULL,
        session_id         TEXT NOT NULL REFERENCES session(session_id) ON DELETE CASCADE,
        created_at         INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_session_event_session_id
        ON session_event(session_id);
";

/// Owns the SQLite connection: opening, migration, and transactions.
///
/// Every command wraps its whole read-decide-append sequence in one
/// [`Database::transaction`], so racing invocations serialize on the
/// database lock and partial failures roll back.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `<data_dir>/pomodoro.db`.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join("pomodoro.db");
        let conn = Connection::open(&path).map_err(|source| StoreError::Open { path, source })?;
        Self::with_connection(conn)
    }

    /// Open an ephemeral in-memory database; vanishes when the process
    /// exits. Used by tests and `--in-memory` runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".into(),
            source,
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        // Referential integrity is off by default in SQLite; the event
        // table's foreign key is load-bearing.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Apply the schema, creating tables and indexes if missing. Must be
    /// called once after opening, before any queries.
    pub fn migrate(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(SCHEMA)
            .map_err(|e| StoreError::Migration(e.to_string()))
    }

    /// Begin an IMMEDIATE transaction. Dropping without
    /// [`Transaction::commit`] rolls back.
    pub fn transaction(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    /// The underlying connection, for constructing a [`Store`] outside a
    /// transaction (tests, one-off queries).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Executes queries against a borrowed connection or transaction.
///
/// `Transaction` derefs to `Connection`, so `Store::new(&tx)` scopes every
/// query to the transaction.
pub struct Store<'c> {
    conn: &'c Connection,
}

impl<'c> Store<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a session row and return it as stored.
    pub fn insert_session(&self, session: &Session) -> Result<Session, StoreError> {
        let stored = self.conn.query_row(
            "INSERT INTO session (session_id, session_kind, planned_secs, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING session_id, session_kind, planned_secs, created_at",
            params![
                session.id.to_string(),
                session.kind.to_string(),
                session.planned_secs,
                session.created_at.timestamp(),
            ],
            session_from_row,
        )?;
        Ok(stored)
    }

    /// Fetch a single session by id.
    pub fn get_session(&self, id: &Uuid) -> Result<Session, StoreError> {
        self.conn
            .query_row(
                "SELECT session_id, session_kind, planned_secs, created_at
                 FROM session
                 WHERE session_id = ?1",
                params![id.to_string()],
                session_from_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::SessionNotFound(*id),
                other => other.into(),
            })
    }

    /// Sessions in descending id order (newest first).
    pub fn list_sessions(
        &self,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Session>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, session_kind, planned_secs, created_at
             FROM session
             ORDER BY session_id DESC
             LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(
            params![limit.map(i64::from).unwrap_or(-1), offset.map(i64::from).unwrap_or(0)],
            session_from_row,
        )?;
        collect(rows)
    }

    /// The most recent session, if any.
    pub fn latest_session(&self) -> Result<Option<Session>, StoreError> {
        Ok(self.list_sessions(Some(1), None)?.pop())
    }

    /// Insert an event row and return it as stored. A reference to a
    /// missing session surfaces as a store error.
    pub fn insert_event(&self, event: &SessionEvent) -> Result<SessionEvent, StoreError> {
        let stored = self.conn.query_row(
            "INSERT INTO session_event (session_event_id, session_event_kind, session_id, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING session_event_id, session_event_kind, session_id, created_at",
            params![
                event.id.to_string(),
                event.kind.to_string(),
                event.session_id.to_string(),
                event.created_at.timestamp(),
            ],
            event_from_row,
        )?;
        Ok(stored)
    }

    /// Events in descending id order (newest first). `session_id` narrows
    /// the result to one session; `None` spans all sessions.
    pub fn list_events(
        &self,
        session_id: Option<&Uuid>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<SessionEvent>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_event_id, session_event_kind, session_id, created_at
             FROM session_event
             WHERE ?1 IS NULL OR session_id = ?1
             ORDER BY session_event_id DESC
             LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(
            params![
                session_id.map(Uuid::to_string),
                limit.map(i64::from).unwrap_or(-1),
                offset.map(i64::from).unwrap_or(0),
            ],
            event_from_row,
        )?;
        collect(rows)
    }
}

fn collect<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> Result<Vec<T>, StoreError> {
    let mut collection = Vec::new();
    for row in rows {
        collection.push(row?);
    }
    Ok(collection)
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: uuid_column(row, 0)?,
        kind: parsed_column(row, 1)?,
        planned_secs: row.get(2)?,
        created_at: instant_column(row, 3)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<SessionEvent> {
    Ok(SessionEvent {
        id: uuid_column(row, 0)?,
        kind: parsed_column(row, 1)?,
        session_id: uuid_column(row, 2)?,
        created_at: instant_column(row, 3)?,
    })
}

fn uuid_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(index)?;
    Uuid::parse_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parsed_column<T>(row: &Row<'_>, index: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let text: String = row.get(index)?;
    text.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, e.into())
    })
}

fn instant_column(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(index)?;
    DateTime::from_timestamp(secs, 0)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(index, secs))
}
