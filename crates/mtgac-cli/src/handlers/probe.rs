//! Probe command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Check the daemon's `/status` endpoint once.
///
/// Does not start anything; useful against a daemon managed elsewhere.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let port = ctx.settings.effective_port();
    match ctx.probe.check(port).await {
        Ok(()) => {
            println!("Daemon on port {port} is healthy");
            Ok(())
        }
        Err(e) => Err(CliError::Health(format!("port {port}: {e}")).into()),
    }
}
