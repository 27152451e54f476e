//! `scanward` -- domain ownership verification and tiered vulnerability scans.
//!
//! # Commands
//!
//! - `verify`: prove ownership of a domain (dns / file / token)
//! - `scan`: prove ownership, then run one scan to its terminal state
//! - `tiers`: show the plan tier to capability table
//! - `config validate|show`: inspect the configuration

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    // `config` reports load errors itself, so logging falls back to defaults there.
    let config = match &cli.command {
        Commands::Config(_) => commands::load_config(&cli.config)
            .await
            .unwrap_or_default(),
        _ => commands::load_config(&cli.config).await?,
    };
    logging::init_tracing(&config.general, cli.log_level.as_deref())?;

    tracing::debug!(config = %cli.config.display(), "scanward starting");

    match cli.command {
        Commands::Verify(args) => commands::verify::execute(args, &config, &writer).await,
        Commands::Scan(args) => commands::scan::execute(args, &config, &writer).await,
        Commands::Tiers => commands::tiers::execute(&config, &writer),
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
