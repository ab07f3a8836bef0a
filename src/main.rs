//! tck - conformance test runner for GraphQL endpoints
//!
//! Replays test cases over HTTP and reports which ones the service under
//! test passes.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use tck::{cli, commands, common::logging};

#[derive(Parser)]
#[command(name = "tck", about = "Conformance test runner for GraphQL endpoints")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/tck-runner/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _guard = match logging::init(cli.command.verbose(), cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::dispatch(cli.command, cli.config.as_deref()).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
