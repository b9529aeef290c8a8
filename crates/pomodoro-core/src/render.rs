//! Status renderer.
//!
//! Projects a [`DerivedState`] to stdout-ready text. Three modes: a default
//! text line, compact JSON, and a user-supplied MiniJinja template over the
//! same five variables (`kind`, `state`, `planned_secs`, `elapsed_secs`,
//! `remaining_secs`). Templates are sandboxed expressions with no
//! filesystem access and no side effects, and unknown variables are
//! rejected instead of rendering as an empty string.

use minijinja::{Environment, UndefinedBehavior};

use crate::error::CoreError;
use crate::reducer::DerivedState;

/// The template behind plain `status` output, e.g.
/// `focus | running | elapsed 05:00 | remaining 20:00`.
pub const DEFAULT_TEXT_TEMPLATE: &str = "{{ kind }} | {{ state }} | elapsed {{ '%02d:%02d' | format(elapsed_secs // 60, elapsed_secs % 60) }} | remaining {{ '%02d:%02d' | format(remaining_secs // 60, remaining_secs % 60) }}";

/// Render `view` as one compact JSON object.
pub fn render_json(view: &DerivedState) -> Result<String, CoreError> {
    Ok(serde_json::to_string(view)?)
}

/// Render `view` through `template`, or the default text template when
/// none is given. Template failures are parse errors.
pub fn render_text(view: &DerivedState, template: Option<&str>) -> Result<String, CoreError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    let output = env.render_str(template.unwrap_or(DEFAULT_TEXT_TEMPLATE), view)?;
    Ok(output)
}
