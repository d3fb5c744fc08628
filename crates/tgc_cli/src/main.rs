//! TrustGraph configurator CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Any failure (the error chain goes to stderr)

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// Process exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const FAILURE: u8 = 1;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so documents printed on stdout stay clean
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(log_filter(cli.verbose, cli.quiet))
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Build(args) => commands::build::execute(args, &cli.assets),
        Commands::List(args) => commands::list::execute(args, &cli.assets),
        Commands::Serve(args) => commands::serve::execute(args, &cli.assets).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(ExitCodes::FAILURE)
        }
    }
}

fn log_filter(verbose: bool, quiet: bool) -> EnvFilter {
    let (ours, others) = match (verbose, quiet) {
        (true, _) => ("debug", "warn"),
        (false, true) => ("error", "error"),
        (false, false) => ("info", "warn"),
    };

    let mut filter = EnvFilter::from_default_env();
    for directive in [
        format!("tgc={}", ours),
        format!("tg_configurator={}", ours),
        others.to_string(),
    ] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}
