use clap::{Parser, Subcommand};
use pomodoro_core::{
    Config, Context, CoreError, Database, HookDispatcher, IdGenerator, SessionService, Store,
    StoreError, SystemClock,
};

mod commands;

#[derive(Parser)]
#[command(name = "pomodoro", version, about = "A simple pomodoro timer")]
struct Cli {
    /// Use an ephemeral in-memory database (state is not persisted)
    #[arg(long, global = true, hide = true)]
    in_memory: bool,

    /// Skip hook execution for this invocation
    #[arg(long, global = true, hide = true)]
    no_hooks: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a new session or resume the paused one
    Start(commands::start::StartArgs),
    /// Pause the current session, or abort it entirely
    Stop(commands::stop::StopArgs),
    /// Display the current session status
    Status(commands::status::StatusArgs),
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(if err.is_parse() { 2 } else { 1 });
    }
}

fn run(cli: Cli) -> Result<(), CoreError> {
    let ctx = Context {
        config: Config::load_or_default(),
        clock: Box::new(SystemClock),
        ids: IdGenerator::new(),
        hooks: (!cli.no_hooks).then(HookDispatcher::from_config_dir),
    };

    let mut db = if cli.in_memory {
        Database::open_in_memory()?
    } else {
        Database::open()?
    };
    db.migrate()?;

    // One transaction around read-decide-append: racing invocations
    // serialize on the database lock, and a killed command rolls back.
    let tx = db.transaction()?;
    {
        let service = SessionService::new(Store::new(&tx), &ctx);
        match cli.command {
            Command::Start(args) => commands::start::run(&service, args)?,
            Command::Stop(args) => commands::stop::run(&service, args)?,
            Command::Status(args) => commands::status::run(&service, args)?,
        }
    }
    tx.commit().map_err(StoreError::from)?;
    Ok(())
}
