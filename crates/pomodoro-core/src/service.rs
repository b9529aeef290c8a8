//! Session service.
//!
//! The state machine over the event store: decides which transition (if
//! any) a command is allowed to append, given the derived state of the
//! latest session. The store itself accepts any event; legality is
//! enforced here, before the append.
//!
//! Expected to run inside the one transaction the CLI wraps around each
//! command, so read-decide-append is atomic with respect to racing
//! invocations.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::context::Context;
use crate::error::{CoreError, StoreError};
use crate::reducer::{reduce, DerivedState, SessionState};
use crate::session::{Session, SessionEvent, SessionEventKind, SessionKind};
use crate::storage::Store;

/// What a `start` command did.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// A new session was created and started.
    Started(Session),
    /// The paused session of the same kind was resumed.
    Resumed(Session),
    /// A session of the same kind is already running; nothing was appended.
    AlreadyRunning(Session),
}

/// What a `stop` command did.
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// The running session was paused.
    Paused(Session),
    /// The session was aborted.
    Aborted(Session),
    /// The session is already paused; nothing was appended.
    AlreadyPaused(Session),
    /// No session is running or paused.
    NoActiveSession,
}

/// Implements the session state machine on top of the store, clock, id
/// generator, and hook dispatcher.
pub struct SessionService<'a> {
    store: Store<'a>,
    ctx: &'a Context,
}

impl<'a> SessionService<'a> {
    pub fn new(store: Store<'a>, ctx: &'a Context) -> Self {
        Self { store, ctx }
    }

    /// Start a new session, or resume the paused one.
    ///
    /// `kind` defaults to focus; `duration` defaults to the configured
    /// length for the kind. A session of a different kind that is still
    /// running or paused blocks the request.
    pub fn start(
        &self,
        kind: Option<SessionKind>,
        duration: Option<Duration>,
    ) -> Result<StartOutcome, CoreError> {
        let requested = kind.unwrap_or(SessionKind::Focus);
        let now = self.ctx.clock.now();

        let Some((session, events)) = self.latest()? else {
            return self.begin(requested, duration, now);
        };

        match reduce(Some(&session), &events, now).view.state {
            SessionState::None | SessionState::Completed | SessionState::Aborted => {
                self.begin(requested, duration, now)
            }
            SessionState::Paused => {
                if session.kind == requested {
                    self.append(SessionEventKind::Resumed, &session, now)?;
                    Ok(StartOutcome::Resumed(session))
                } else {
                    Err(CoreError::ResumeConflict {
                        requested,
                        current: session.kind,
                    })
                }
            }
            SessionState::Running => {
                if session.kind == requested {
                    Ok(StartOutcome::AlreadyRunning(session))
                } else {
                    Err(CoreError::StartConflict {
                        requested,
                        current: session.kind,
                    })
                }
            }
        }
    }

    /// Pause the running session, or abort it when `reset` is set.
    pub fn stop(&self, reset: bool) -> Result<StopOutcome, CoreError> {
        let now = self.ctx.clock.now();

        let Some((session, events)) = self.latest()? else {
            return Ok(StopOutcome::NoActiveSession);
        };

        match reduce(Some(&session), &events, now).view.state {
            SessionState::Running => {
                if reset {
                    self.append(SessionEventKind::Aborted, &session, now)?;
                    Ok(StopOutcome::Aborted(session))
                } else {
                    self.append(SessionEventKind::Paused, &session, now)?;
                    Ok(StopOutcome::Paused(session))
                }
            }
            SessionState::Paused => {
                if reset {
                    self.append(SessionEventKind::Aborted, &session, now)?;
                    Ok(StopOutcome::Aborted(session))
                } else {
                    Ok(StopOutcome::AlreadyPaused(session))
                }
            }
            _ => Ok(StopOutcome::NoActiveSession),
        }
    }

    /// The derived state of the latest session.
    ///
    /// The one write a read command performs: a session still marked
    /// running whose planned time has run out gets a `completed` event,
    /// stamped at the instant the time ran out rather than at whenever
    /// this status call happens to occur. Idempotent: the session is
    /// terminal afterwards, so a second call appends nothing.
    pub fn status(&self) -> Result<DerivedState, CoreError> {
        let now = self.ctx.clock.now();

        let Some((session, events)) = self.latest()? else {
            return Ok(DerivedState::none());
        };

        let reduction = reduce(Some(&session), &events, now);
        let mut view = reduction.view;
        if view.state == SessionState::Running && view.remaining_secs == 0 {
            let completed_at = reduction.expires_at.unwrap_or(now);
            self.append(SessionEventKind::Completed, &session, completed_at)?;
            view.state = SessionState::Completed;
        }
        Ok(view)
    }

    /// The latest session and its events in causal order.
    fn latest(&self) -> Result<Option<(Session, Vec<SessionEvent>)>, StoreError> {
        let Some(session) = self.store.latest_session()? else {
            return Ok(None);
        };
        let mut events = self.store.list_events(Some(&session.id), None, None)?;
        events.reverse();
        Ok(Some((session, events)))
    }

    /// Create a session together with its `started` event.
    fn begin(
        &self,
        kind: SessionKind,
        duration: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<StartOutcome, CoreError> {
        let planned = duration.unwrap_or_else(|| self.ctx.config.default_duration(kind));
        let planned_secs = planned.as_secs() as i64;
        if planned_secs <= 0 {
            return Err(CoreError::EmptyDuration);
        }

        let session = self.store.insert_session(&Session {
            id: self.ctx.ids.generate(),
            kind,
            planned_secs,
            created_at: now,
        })?;
        self.append(SessionEventKind::Started, &session, now)?;
        Ok(StartOutcome::Started(session))
    }

    /// Append one event and fire its hook.
    fn append(
        &self,
        kind: SessionEventKind,
        session: &Session,
        at: DateTime<Utc>,
    ) -> Result<SessionEvent, CoreError> {
        let event = self.store.insert_event(&SessionEvent::new(
            self.ctx.ids.generate(),
            kind,
            session.id,
            at,
        ))?;
        if let Some(hooks) = &self.ctx.hooks {
            hooks.dispatch(session, &event);
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::Config;
    use crate::id::IdGenerator;
    use crate::reducer::DerivedKind;
    use crate::storage::Database;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    fn minutes(m: i64) -> chrono::Duration {
        chrono::Duration::minutes(m)
    }

    fn harness() -> (Database, Context, FixedClock) {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        let clock = FixedClock::at(t0());
        let ctx = Context {
            config: Config::default(),
            clock: Box::new(clock.clone()),
            ids: IdGenerator::new(),
            hooks: None,
        };
        (db, ctx, clock)
    }

    fn service<'a>(db: &'a Database, ctx: &'a Context) -> SessionService<'a> {
        SessionService::new(Store::new(db.connection()), ctx)
    }

    fn event_kinds(db: &Database) -> Vec<SessionEventKind> {
        let mut events = Store::new(db.connection())
            .list_events(None, None, None)
            .unwrap();
        events.reverse();
        events.into_iter().map(|e| e.kind).collect()
    }

    /// How many sessions in the store are neither completed nor aborted.
    fn non_terminal_count(db: &Database, ctx: &Context) -> usize {
        let store = Store::new(db.connection());
        store
            .list_sessions(None, None)
            .unwrap()
            .into_iter()
            .filter(|session| {
                let mut events = store.list_events(Some(&session.id), None, None).unwrap();
                events.reverse();
                let state = reduce(Some(session), &events, ctx.clock.now()).view.state;
                !matches!(state, SessionState::Completed | SessionState::Aborted)
            })
            .count()
    }

    #[test]
    fn start_creates_a_session_with_its_started_event() {
        let (db, ctx, _clock) = harness();
        let outcome = service(&db, &ctx).start(None, None).unwrap();

        let StartOutcome::Started(session) = outcome else {
            panic!("expected a new session");
        };
        assert_eq!(session.kind, SessionKind::Focus);
        assert_eq!(session.planned_secs, 1500);
        assert_eq!(session.created_at, t0());
        assert_eq!(event_kinds(&db), vec![SessionEventKind::Started]);
    }

    #[test]
    fn start_uses_the_configured_break_duration() {
        let (db, ctx, _clock) = harness();
        let outcome = service(&db, &ctx)
            .start(Some(SessionKind::Break), None)
            .unwrap();

        let StartOutcome::Started(session) = outcome else {
            panic!("expected a new session");
        };
        assert_eq!(session.kind, SessionKind::Break);
        assert_eq!(session.planned_secs, 300);
    }

    #[test]
    fn start_honors_an_explicit_duration() {
        let (db, ctx, _clock) = harness();
        let outcome = service(&db, &ctx)
            .start(None, Some(Duration::from_secs(600)))
            .unwrap();

        let StartOutcome::Started(session) = outcome else {
            panic!("expected a new session");
        };
        assert_eq!(session.planned_secs, 600);
    }

    #[test]
    fn start_rejects_a_zero_duration() {
        let (db, ctx, _clock) = harness();
        let result = service(&db, &ctx).start(None, Some(Duration::ZERO));
        assert!(matches!(result, Err(CoreError::EmptyDuration)));
        assert!(event_kinds(&db).is_empty());
    }

    #[test]
    fn start_while_running_same_kind_is_a_noop() {
        let (db, ctx, _clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();

        let outcome = service(&db, &ctx).start(None, None).unwrap();
        assert!(matches!(outcome, StartOutcome::AlreadyRunning(_)));
        assert_eq!(event_kinds(&db), vec![SessionEventKind::Started]);
    }

    #[test]
    fn start_while_running_other_kind_is_refused() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(Some(SessionKind::Focus), None).unwrap();
        clock.advance(minutes(1));

        let result = service(&db, &ctx).start(Some(SessionKind::Break), None);
        let Err(CoreError::StartConflict { requested, current }) = result else {
            panic!("expected a start conflict");
        };
        assert_eq!(requested, SessionKind::Break);
        assert_eq!(current, SessionKind::Focus);
        // The refused call appended nothing.
        assert_eq!(event_kinds(&db), vec![SessionEventKind::Started]);
    }

    #[test]
    fn start_while_paused_same_kind_resumes() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(10));
        service(&db, &ctx).stop(false).unwrap();
        clock.advance(minutes(10));

        let outcome = service(&db, &ctx).start(None, None).unwrap();
        assert!(matches!(outcome, StartOutcome::Resumed(_)));
        assert_eq!(
            event_kinds(&db),
            vec![
                SessionEventKind::Started,
                SessionEventKind::Paused,
                SessionEventKind::Resumed,
            ]
        );
    }

    #[test]
    fn start_while_paused_other_kind_is_refused() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(Some(SessionKind::Break), None).unwrap();
        clock.advance(minutes(1));
        service(&db, &ctx).stop(false).unwrap();

        let result = service(&db, &ctx).start(Some(SessionKind::Focus), None);
        let Err(CoreError::ResumeConflict { requested, current }) = result else {
            panic!("expected a resume conflict");
        };
        assert_eq!(requested, SessionKind::Focus);
        assert_eq!(current, SessionKind::Break);
    }

    #[test]
    fn conflict_messages_name_both_kinds() {
        let start = CoreError::StartConflict {
            requested: SessionKind::Break,
            current: SessionKind::Focus,
        };
        assert_eq!(
            start.to_string(),
            "cannot start break; a focus session is already in progress"
        );

        let resume = CoreError::ResumeConflict {
            requested: SessionKind::Focus,
            current: SessionKind::Break,
        };
        assert_eq!(
            resume.to_string(),
            "cannot resume focus; a break session is paused"
        );
    }

    #[test]
    fn start_after_a_terminal_session_creates_a_new_one() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(3));
        service(&db, &ctx).stop(true).unwrap();
        clock.advance(minutes(1));

        let outcome = service(&db, &ctx).start(None, None).unwrap();
        assert!(matches!(outcome, StartOutcome::Started(_)));

        let sessions = Store::new(db.connection()).list_sessions(None, None).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(non_terminal_count(&db, &ctx), 1);
    }

    #[test]
    fn stop_pauses_a_running_session() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(10));

        let outcome = service(&db, &ctx).stop(false).unwrap();
        assert!(matches!(outcome, StopOutcome::Paused(_)));
        assert_eq!(
            event_kinds(&db),
            vec![SessionEventKind::Started, SessionEventKind::Paused]
        );
    }

    #[test]
    fn stop_with_reset_aborts_a_running_session() {
        let (db, ctx, _clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();

        let outcome = service(&db, &ctx).stop(true).unwrap();
        assert!(matches!(outcome, StopOutcome::Aborted(_)));
        assert_eq!(
            event_kinds(&db),
            vec![SessionEventKind::Started, SessionEventKind::Aborted]
        );
    }

    #[test]
    fn stop_on_a_paused_session_is_a_noop() {
        let (db, ctx, _clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        service(&db, &ctx).stop(false).unwrap();

        let outcome = service(&db, &ctx).stop(false).unwrap();
        assert!(matches!(outcome, StopOutcome::AlreadyPaused(_)));
        assert_eq!(
            event_kinds(&db),
            vec![SessionEventKind::Started, SessionEventKind::Paused]
        );
    }

    #[test]
    fn stop_with_reset_aborts_a_paused_session() {
        let (db, ctx, _clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        service(&db, &ctx).stop(false).unwrap();

        let outcome = service(&db, &ctx).stop(true).unwrap();
        assert!(matches!(outcome, StopOutcome::Aborted(_)));
    }

    #[test]
    fn stop_with_no_sessions_reports_nothing_active() {
        let (db, ctx, _clock) = harness();
        let outcome = service(&db, &ctx).stop(false).unwrap();
        assert_eq!(outcome, StopOutcome::NoActiveSession);
        assert!(event_kinds(&db).is_empty());
    }

    #[test]
    fn stop_after_a_terminal_session_reports_nothing_active() {
        let (db, ctx, _clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        service(&db, &ctx).stop(true).unwrap();

        let outcome = service(&db, &ctx).stop(false).unwrap();
        assert_eq!(outcome, StopOutcome::NoActiveSession);
    }

    #[test]
    fn status_on_an_empty_store_is_none() {
        let (db, ctx, _clock) = harness();
        let view = service(&db, &ctx).status().unwrap();
        assert_eq!(view, DerivedState::none());
    }

    #[test]
    fn status_reports_a_running_session() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(5));

        let view = service(&db, &ctx).status().unwrap();
        assert_eq!(
            view,
            DerivedState {
                kind: DerivedKind::Focus,
                state: SessionState::Running,
                planned_secs: 1500,
                elapsed_secs: 300,
                remaining_secs: 1200,
            }
        );
    }

    #[test]
    fn status_reports_a_paused_session_without_accumulating() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(10));
        service(&db, &ctx).stop(false).unwrap();
        clock.advance(minutes(20));

        let view = service(&db, &ctx).status().unwrap();
        assert_eq!(view.state, SessionState::Paused);
        assert_eq!(view.elapsed_secs, 600);
        assert_eq!(view.remaining_secs, 900);
    }

    #[test]
    fn status_after_resume_sums_the_running_intervals() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(10));
        service(&db, &ctx).stop(false).unwrap();
        clock.advance(minutes(10));
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(5));

        let view = service(&db, &ctx).status().unwrap();
        assert_eq!(view.state, SessionState::Running);
        assert_eq!(view.elapsed_secs, 900);
        assert_eq!(view.remaining_secs, 600);
    }

    #[test]
    fn status_auto_completes_an_expired_session() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(30));

        let view = service(&db, &ctx).status().unwrap();
        assert_eq!(view.state, SessionState::Completed);
        assert_eq!(view.elapsed_secs, 1500);
        assert_eq!(view.remaining_secs, 0);

        // The completion is stamped when the time ran out, not when the
        // user happened to ask.
        let mut events = Store::new(db.connection())
            .list_events(None, None, None)
            .unwrap();
        events.reverse();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, SessionEventKind::Completed);
        assert_eq!(events[1].created_at, t0() + minutes(25));
    }

    #[test]
    fn status_auto_completion_is_idempotent() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(30));

        service(&db, &ctx).status().unwrap();
        let view = service(&db, &ctx).status().unwrap();
        assert_eq!(view.state, SessionState::Completed);
        assert_eq!(
            event_kinds(&db),
            vec![SessionEventKind::Started, SessionEventKind::Completed]
        );
    }

    #[test]
    fn auto_completion_accounts_for_paused_time() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(10));
        service(&db, &ctx).stop(false).unwrap();
        clock.advance(minutes(10));
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(60));

        let view = service(&db, &ctx).status().unwrap();
        assert_eq!(view.state, SessionState::Completed);

        // 10 minutes had elapsed before the resume at t0+20m, so the
        // remaining 15 minutes ran out at t0+35m.
        let events = Store::new(db.connection())
            .list_events(None, Some(1), None)
            .unwrap();
        assert_eq!(events[0].kind, SessionEventKind::Completed);
        assert_eq!(events[0].created_at, t0() + minutes(35));
    }

    #[test]
    fn start_after_auto_completion_creates_a_new_session() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(30));
        service(&db, &ctx).status().unwrap();

        let outcome = service(&db, &ctx).start(None, None).unwrap();
        assert!(matches!(outcome, StartOutcome::Started(_)));
        assert_eq!(non_terminal_count(&db, &ctx), 1);
    }

    #[test]
    fn abort_then_start_restarts_from_zero() {
        let (db, ctx, clock) = harness();
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(3));
        service(&db, &ctx).stop(true).unwrap();
        clock.advance(minutes(1));
        service(&db, &ctx).start(None, None).unwrap();

        let view = service(&db, &ctx).status().unwrap();
        assert_eq!(view.kind, DerivedKind::Focus);
        assert_eq!(view.state, SessionState::Running);
        assert_eq!(view.elapsed_secs, 0);

        let store = Store::new(db.connection());
        let sessions = store.list_sessions(None, None).unwrap();
        assert_eq!(sessions.len(), 2);
        let first = &sessions[1];
        let mut events = store.list_events(Some(&first.id), None, None).unwrap();
        events.reverse();
        let state = reduce(Some(first), &events, ctx.clock.now()).view.state;
        assert_eq!(state, SessionState::Aborted);
    }

    #[test]
    fn at_most_one_session_is_ever_non_terminal() {
        let (db, ctx, clock) = harness();
        let steps: Vec<Box<dyn Fn(&SessionService<'_>)>> = vec![
            Box::new(|s| drop(s.start(None, None))),
            Box::new(|s| drop(s.stop(false))),
            Box::new(|s| drop(s.start(None, None))),
            Box::new(|s| drop(s.stop(true))),
            Box::new(|s| drop(s.start(Some(SessionKind::Break), None))),
            Box::new(|s| drop(s.status())),
            Box::new(|s| drop(s.stop(true))),
            Box::new(|s| drop(s.start(None, None))),
        ];
        for step in steps {
            step(&service(&db, &ctx));
            clock.advance(minutes(2));
            assert!(non_terminal_count(&db, &ctx) <= 1);
        }
    }

    #[cfg(unix)]
    #[test]
    fn transitions_fire_their_hooks_in_order() {
        use crate::hooks::HookDispatcher;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        for name in ["start", "stop"] {
            let script = dir.path().join(name);
            let log = dir.path().join(format!("{name}.log"));
            // Append the payload, one line per invocation.
            std::fs::write(
                &script,
                format!(
                    "#!/bin/sh\ncat >> {log}\necho >> {log}\n",
                    log = log.display()
                ),
            )
            .unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn logged_kinds(path: &std::path::Path) -> Vec<String> {
            std::fs::read_to_string(path)
                .unwrap()
                .lines()
                .map(|line| {
                    let payload: serde_json::Value = serde_json::from_str(line).unwrap();
                    payload["session_event"]["kind"].as_str().unwrap().to_string()
                })
                .collect()
        }

        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        let clock = FixedClock::at(t0());
        let ctx = Context {
            config: Config::default(),
            clock: Box::new(clock.clone()),
            ids: IdGenerator::new(),
            hooks: Some(HookDispatcher::new(dir.path().to_path_buf())),
        };

        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(1));
        service(&db, &ctx).stop(false).unwrap();
        clock.advance(minutes(1));
        service(&db, &ctx).start(None, None).unwrap();
        clock.advance(minutes(60));
        service(&db, &ctx).status().unwrap();

        assert_eq!(
            logged_kinds(&dir.path().join("start.log")),
            vec!["started", "resumed"]
        );
        assert_eq!(
            logged_kinds(&dir.path().join("stop.log")),
            vec!["paused", "completed"]
        );
    }
}
