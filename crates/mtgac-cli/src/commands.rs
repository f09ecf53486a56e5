//! Available subcommands.

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the daemon and keep it healthy until Ctrl-C
    Run,

    /// Probe the daemon's /status endpoint once (exit status reflects health)
    Probe,

    /// Show where the daemon binary is resolved from
    Locate,

    /// Print the effective configuration as JSON
    Config,
}
