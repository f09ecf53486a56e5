//! CLI entry point - the composition root.
//!
//! The only place where logging, settings and infrastructure are wired
//! together. Command dispatch routes to handlers.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mtgac_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let config = CliConfig::from_cli(cli)?;
    let ctx = bootstrap(config)?;

    match cli.command {
        Commands::Run => handlers::run::execute(&ctx).await,
        Commands::Probe => handlers::probe::execute(&ctx).await,
        Commands::Locate => handlers::locate::execute(&ctx).await,
        Commands::Config => handlers::config::execute(&ctx).await,
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables before clap reads MTGAC_*
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = dispatch(&cli).await {
        eprintln!("Error: {err}");
        std::process::exit(CliError::exit_code_for(&err));
    }
}
