use std::time::Duration;

use clap::{Args, ValueEnum};
use pomodoro_core::{CoreError, SessionKind, SessionService, StartOutcome};

/// The session mode to start.
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Focus,
    Break,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Focus => write!(f, "focus"),
            Self::Break => write!(f, "break"),
        }
    }
}

impl From<Mode> for SessionKind {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Focus => SessionKind::Focus,
            Mode::Break => SessionKind::Break,
        }
    }
}

#[derive(Args, Debug)]
pub struct StartArgs {
    /// The session mode
    #[arg(short, long, value_enum, default_value_t = Mode::Focus)]
    pub mode: Mode,

    /// The session length, e.g. "25m" or "1h30m"; defaults to the
    /// configured length for the mode
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,
}

pub fn run(service: &SessionService<'_>, args: StartArgs) -> Result<(), CoreError> {
    match service.start(Some(args.mode.into()), args.duration)? {
        StartOutcome::Started(session) => println!("Started a new {} session.", session.kind),
        StartOutcome::Resumed(session) => println!("Resumed the {} session.", session.kind),
        StartOutcome::AlreadyRunning(session) => {
            println!("A {} session is already running.", session.kind)
        }
    }
    Ok(())
}
