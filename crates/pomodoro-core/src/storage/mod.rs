//! Persistence layer: directory resolution and the SQLite event store.

pub mod database;

pub use database::{Database, Store};

use std::env;
use std::path::PathBuf;

/// Returns the configuration directory, `$XDG_CONFIG_HOME/pomodoro` or the
/// platform equivalent of `~/.config/pomodoro`.
///
/// The environment variable is consulted directly so that tests (and
/// scripts) can redirect configuration on every platform.
pub fn config_dir() -> PathBuf {
    base_dir("XDG_CONFIG_HOME", dirs::config_dir).join("pomodoro")
}

/// Returns the data directory, `$XDG_DATA_HOME/pomodoro` or the platform
/// equivalent of `~/.local/share/pomodoro`. Holds the database file.
pub fn data_dir() -> PathBuf {
    base_dir("XDG_DATA_HOME", dirs::data_dir).join("pomodoro")
}

fn base_dir(var: &str, fallback: fn() -> Option<PathBuf>) -> PathBuf {
    match env::var_os(var) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => fallback().unwrap_or_else(|| PathBuf::from(".")),
    }
}
