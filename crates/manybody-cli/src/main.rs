mod cli;
mod commands;
mod error;
mod logging;
mod output;
mod progress;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {e}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("🚀 manybody CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    if let Some(num_threads) = cli.threads {
        info!("Setting the global thread pool to {num_threads} threads.");
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| {
                CliError::InvalidArgument(format!("Failed to build global thread pool: {e}"))
            })?;
    }

    let quiet = cli.quiet;
    let command_result = match cli.command {
        Commands::Tba(args) => {
            info!("Dispatching to 'tba' command.");
            commands::tba::run(args, quiet)
        }
        Commands::Ed(args) => {
            info!("Dispatching to 'ed' command.");
            commands::ed::run(args, quiet)
        }
        Commands::Cpt(args) => {
            info!("Dispatching to 'cpt' command.");
            commands::cpt::run(args, quiet)
        }
        Commands::Dmrg(args) => {
            info!("Dispatching to 'dmrg' command.");
            commands::dmrg::run(args, quiet)
        }
    };

    match &command_result {
        Ok(_) => {
            info!("✅ Command completed successfully.");
            if !quiet {
                println!("✅ Command completed successfully.");
            }
        }
        Err(e) => {
            error!("❌ Command failed: {e}");
        }
    }

    command_result
}
