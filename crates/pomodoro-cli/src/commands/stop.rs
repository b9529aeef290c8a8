use clap::Args;
use pomodoro_core::{CoreError, SessionService, StopOutcome};

#[derive(Args, Debug, Default)]
pub struct StopArgs {
    /// Abort the session instead of pausing it
    #[arg(short, long)]
    pub reset: bool,
}

pub fn run(service: &SessionService<'_>, args: StopArgs) -> Result<(), CoreError> {
    match service.stop(args.reset)? {
        StopOutcome::Paused(session) => println!("Paused the {} session.", session.kind),
        StopOutcome::Aborted(session) => println!("Aborted the {} session.", session.kind),
        StopOutcome::AlreadyPaused(session) => {
            println!("The {} session is already paused.", session.kind)
        }
        StopOutcome::NoActiveSession => println!("No active session found."),
    }
    Ok(())
}
