//! Locate command handler.
//!
//! Shows which daemon executable `run` would launch.

use std::path::PathBuf;

use anyhow::Result;
use mtgac_core::LocateError;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Print the resolved daemon path, or every location that was searched.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    match resolve(ctx) {
        Ok(path) => {
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            if let LocateError::NotFound { searched } = &e {
                eprintln!("Searched:");
                for path in searched {
                    eprintln!("  {}", path.display());
                }
            }
            Err(CliError::BinaryNotFound(e.to_string()).into())
        }
    }
}

fn resolve(ctx: &CliContext) -> Result<PathBuf, LocateError> {
    let configured = ctx.settings.daemon_path.as_deref().map(PathBuf::from);
    ctx.locator.locate(configured.as_deref())
}
