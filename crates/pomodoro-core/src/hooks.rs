//! Hook dispatcher.
//!
//! User executables under `<config_dir>/hooks/` are invoked on state
//! transitions: `start` for started/resumed events, `stop` for paused,
//! aborted, and completed events. The hook receives a JSON payload on
//! stdin describing the session and the event that fired.
//!
//! Dispatch is strictly fire-and-forget from the user's point of view: a
//! missing or non-executable file is skipped, and spawn or write failures
//! never surface; by the time a hook runs, the event is already persisted.
//! The dispatcher does wait for the child to exit (its exit status and
//! output are ignored), so "transition, then hook" is an observable
//! ordering.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::session::{Session, SessionEvent, SessionEventKind};
use crate::storage::config_dir;

/// The JSON payload written to a hook's stdin.
#[derive(Debug, Serialize)]
pub struct HookPayload<'a> {
    /// The session associated with the event.
    pub session: &'a Session,
    /// The event that triggered the hook.
    pub session_event: &'a SessionEvent,
}

/// Invokes user hook executables on session transitions.
#[derive(Debug, Clone)]
pub struct HookDispatcher {
    dir: PathBuf,
}

impl HookDispatcher {
    /// A dispatcher over an explicit hooks directory.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// A dispatcher over `<config_dir>/hooks`.
    pub fn from_config_dir() -> Self {
        Self::new(config_dir().join("hooks"))
    }

    /// Run the hook matching `event`, if one is installed.
    ///
    /// Never fails: hook problems are not the command's problem.
    pub fn dispatch(&self, session: &Session, event: &SessionEvent) {
        let path = self.dir.join(hook_name(event.kind));
        if !is_executable(&path) {
            return;
        }

        let payload = HookPayload {
            session,
            session_event: event,
        };
        let Ok(data) = serde_json::to_string(&payload) else {
            return;
        };

        let child = Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let Ok(mut child) = child else {
            return;
        };

        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(data.as_bytes());
            // Dropping stdin sends EOF before we wait.
        }
        let _ = child.wait();
    }
}

/// Map an event to its hook file name: `start` for started/resumed,
/// `stop` for everything else.
fn hook_name(kind: SessionEventKind) -> &'static str {
    match kind {
        SessionEventKind::Started | SessionEventKind::Resumed => "start",
        _ => "stop",
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
