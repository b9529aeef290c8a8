use clap::{Args, ValueEnum};
use pomodoro_core::{render_json, render_text, CoreError, SessionService};

/// The output format for status.
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Output {
    /// One human-readable line.
    #[default]
    Text,
    /// One machine-readable JSON object.
    Json,
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// The output type
    #[arg(short, long, value_enum, default_value_t = Output::Text)]
    pub output: Output,

    /// Custom template for text output
    #[arg(short, long)]
    pub format: Option<String>,
}

pub fn run(service: &SessionService<'_>, args: StatusArgs) -> Result<(), CoreError> {
    if args.output == Output::Json && args.format.is_some() {
        return Err(CoreError::InvalidArgument(
            "--format is only valid with --output text".into(),
        ));
    }

    let view = service.status()?;
    let line = match args.output {
        Output::Json => render_json(&view)?,
        Output::Text => render_text(&view, args.format.as_deref())?,
    };
    println!("{line}");
    Ok(())
}
