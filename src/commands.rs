//! CLI command definitions
//!
//! Defines the clap commands for the conformance runner.

use clap::Subcommand;
use std::path::PathBuf;

use crate::compare::CompareMode;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the test cases found under a directory or in a YAML file
    Run {
        /// Directory of test cases, or a single YAML case file
        path: PathBuf,

        /// Full endpoint URL; overrides --host and --port
        #[arg(long)]
        endpoint: Option<String>,

        /// Endpoint host
        #[arg(long)]
        host: Option<String>,

        /// Endpoint port
        #[arg(long)]
        port: Option<u16>,

        /// Connect timeout in milliseconds
        #[arg(long, value_name = "MS")]
        connect_timeout: Option<u64>,

        /// Read timeout in milliseconds
        #[arg(long, value_name = "MS")]
        read_timeout: Option<u64>,

        /// How strictly responses are compared (default: lenient)
        #[arg(long, value_enum)]
        mode: Option<CompareMode>,

        /// Retry each call this many times on transport failures
        #[arg(long)]
        retries: Option<u32>,

        /// Run up to N isolated cases at the same time
        #[arg(long, value_name = "N")]
        max_parallel: Option<usize>,

        /// Only run cases whose name contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Print a JSON summary instead of progress lines
        #[arg(long)]
        json: bool,

        /// Also write a JUnit XML report to this file
        #[arg(long, value_name = "FILE")]
        junit: Option<PathBuf>,

        /// Show debug logs and response previews of failing cases
        #[arg(long, short)]
        verbose: bool,
    },

    /// List the test cases in run order, with load errors
    List {
        /// Directory of test cases, or a single YAML case file
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Whether debug logging was requested
    pub fn verbose(&self) -> bool {
        matches!(self, Commands::Run { verbose: true, .. })
    }
}
