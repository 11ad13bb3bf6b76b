//! sunscan binary entry point.
//!
//! Parses the command line, installs the tracing subscriber, and
//! dispatches to the subcommand handlers. Scan-level failures are logged
//! outcomes, not process errors; only invocation and local environment
//! problems exit non-zero.

use clap::Parser;
use sunscan::cli::{Cli, Commands};
use sunscan::output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Scan(cmd) => cmd.execute(cli.verbose, cli.quiet).await,
        Commands::History(cmd) => cmd.execute(cli.quiet),
        Commands::Export(cmd) => cmd.execute(cli.quiet),
    };

    if let Err(e) = result {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}

/// Install the process-wide subscriber.
///
/// `RUST_LOG` wins when set; otherwise the verbosity flags pick the
/// default level.
fn init_tracing(verbose: bool, quiet: bool) {
    let default_directive = if quiet {
        "sunscan=error"
    } else if verbose {
        "sunscan=debug"
    } else {
        "sunscan=info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
