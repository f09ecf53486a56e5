//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext) -> Result<()>`
//! - Build what they need from the context, call into the runtime and
//!   format the outcome for the terminal.
//!
//! Failures are returned as [`CliError`](crate::error::CliError) so `main`
//! can map them to an exit code.

pub mod config;
pub mod locate;
pub mod probe;
pub mod run;
