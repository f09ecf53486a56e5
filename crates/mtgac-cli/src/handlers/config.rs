//! Config command handler.

use anyhow::Result;
use mtgac_core::DaemonSettings;

use crate::bootstrap::CliContext;

/// Print the effective settings as pretty JSON.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    println!("{}", render(&ctx.settings)?);
    Ok(())
}

fn render(settings: &DaemonSettings) -> Result<String> {
    Ok(serde_json::to_string_pretty(settings)?)
}
