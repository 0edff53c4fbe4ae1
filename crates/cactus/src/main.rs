//! Cactus CLI - development server for static sites.
//!
//! Provides commands for:
//! - `serve`: Serve the built site with live reload

mod commands;
mod error;
mod output;
mod watch;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::ServeArgs;
use output::Output;

/// Cactus - static site development server.
#[derive(Parser)]
#[command(name = "cactus", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the built site and reload browsers when files change.
    Serve(ServeArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // Check if verbose flag is set for serve command
    let verbose = matches!(&cli.command, Commands::Serve(args) if args.verbose);

    tracing_subscriber::fmt().with_env_filter(log_filter(verbose)).init();

    let result = match cli.command {
        Commands::Serve(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// Tracing filter for the process.
///
/// --verbose enables INFO level (request log), otherwise use `RUST_LOG` or
/// default to WARN.
fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}
