//! CLI command handling
//!
//! Resolves configuration, loads test cases and drives the runner.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cases::{CaseEntry, CaseStore};
use crate::commands::Commands;
use crate::common::{Config, Error, Result};
use crate::compare::CompareMode;
use crate::http::HttpTransport;
use crate::testing::{CaseRunner, ConsoleEmitter, JUnitEmitter, JsonEmitter, Reporter};

/// Configuration values given on the command line
#[derive(Debug, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub connect_timeout: Option<u64>,
    pub read_timeout: Option<u64>,
    pub mode: Option<CompareMode>,
    pub retries: Option<u32>,
    pub max_parallel: Option<usize>,
}

impl Overrides {
    /// Layer the flags over file and environment configuration
    pub fn apply(self, config: &mut Config) -> Result<()> {
        if self.host.is_some() || self.port.is_some() {
            config.endpoint.url = None;
        }
        if let Some(url) = self.endpoint {
            config.endpoint.url = Some(url);
        }
        if let Some(host) = self.host {
            config.endpoint.host = host;
        }
        if let Some(port) = self.port {
            config.endpoint.port = port;
        }
        if let Some(ms) = self.connect_timeout {
            config.timeouts.connect_ms = ms;
        }
        if let Some(ms) = self.read_timeout {
            config.timeouts.read_ms = ms;
        }
        if let Some(mode) = self.mode {
            config.run.compare_mode = mode;
        }
        if let Some(retries) = self.retries {
            config.run.retries = retries;
        }
        if let Some(max) = self.max_parallel {
            config.run.max_parallel = max;
        }
        config.validate()
    }
}

/// Options that shape a run's output
#[derive(Debug, Default)]
pub struct RunOptions {
    pub filter: Option<String>,
    pub json: bool,
    pub junit: Option<PathBuf>,
    pub verbose: bool,
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config_file: Option<&Path>) -> Result<()> {
    match command {
        Commands::Run {
            path,
            endpoint,
            host,
            port,
            connect_timeout,
            read_timeout,
            mode,
            retries,
            max_parallel,
            filter,
            json,
            junit,
            verbose,
        } => {
            let mut config = load_config(config_file)?;
            Overrides {
                endpoint,
                host,
                port,
                connect_timeout,
                read_timeout,
                mode,
                retries,
                max_parallel,
            }
            .apply(&mut config)?;

            let options = RunOptions {
                filter,
                json,
                junit,
                verbose,
            };
            run(&path, &config, options).await
        }

        Commands::List { path, json } => list(&path, json),
    }
}

/// Configuration file (explicit or default location), then environment
fn load_config(config_file: Option<&Path>) -> Result<Config> {
    let mut config = match config_file {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env()?;
    Ok(config)
}

/// Run all cases under `path` and fail if any case failed
pub async fn run(path: &Path, config: &Config, options: RunOptions) -> Result<()> {
    let store = CaseStore::open(path)?;
    let mut entries = store.load()?;
    if let Some(filter) = &options.filter {
        entries.retain(|entry| entry.name().contains(filter.as_str()));
    }

    let transport = HttpTransport::new(config)?;
    tracing::info!(
        endpoint = %transport.endpoint(),
        cases = entries.len(),
        mode = %config.run.compare_mode,
        "Starting conformance run"
    );

    let mut reporter = Reporter::new();
    if options.json {
        reporter = reporter.with_emitter(JsonEmitter::new(std::io::stdout()));
    } else {
        println!(
            "\n{} {} {}",
            "Running:".blue().bold(),
            store.root().display().to_string().white().bold(),
            format!("against {}", transport.endpoint()).dimmed()
        );
        reporter = reporter.with_emitter(ConsoleEmitter::new(options.verbose));
    }
    if let Some(junit) = options.junit {
        reporter = reporter.with_emitter(JUnitEmitter::new(junit));
    }

    let runner = CaseRunner::from_config(transport, &config.run);
    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(cancel.clone());

    let result = runner.run_all(entries, &mut reporter, &cancel).await;
    watcher.abort();
    let tally = result?;

    if tally.is_success() {
        Ok(())
    } else {
        Err(Error::SuiteFailed {
            failed: tally.failed,
            total: tally.total,
        })
    }
}

/// Cancel the run on the first Ctrl-C
fn cancel_on_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling remaining test cases");
            cancel.cancel();
        }
    })
}

#[derive(Serialize)]
struct ListedCase<'a> {
    name: &'a str,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<i32>,
    ignore: bool,
    isolated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a CaseEntry> for ListedCase<'a> {
    fn from(entry: &'a CaseEntry) -> Self {
        let source = entry.source().display().to_string();
        match entry {
            CaseEntry::Ready(case) => ListedCase {
                name: &case.name,
                source,
                priority: Some(case.priority),
                ignore: case.ignore,
                isolated: case.isolated,
                error: None,
            },
            CaseEntry::Invalid { name, error, .. } => ListedCase {
                name,
                source,
                priority: None,
                ignore: false,
                isolated: false,
                error: Some(error.to_string()),
            },
        }
    }
}

/// Print the resolved cases in run order
fn list(path: &Path, json: bool) -> Result<()> {
    let entries = CaseStore::open(path)?.load()?;

    if json {
        let listed: Vec<ListedCase> = entries.iter().map(ListedCase::from).collect();
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No test cases found in {}", path.display());
        return Ok(());
    }

    for entry in &entries {
        print_entry(entry);
    }

    let invalid = entries
        .iter()
        .filter(|e| matches!(e, CaseEntry::Invalid { .. }))
        .count();
    println!("\n{} test cases, {} invalid", entries.len(), invalid);
    Ok(())
}

fn print_entry(entry: &CaseEntry) {
    match entry {
        CaseEntry::Ready(case) => {
            let mut tags = vec![format!("priority {}", case.priority)];
            if case.isolated {
                tags.push("isolated".to_string());
            }
            if case.ignore {
                tags.push("ignored".to_string());
            }
            println!(
                "  {} {} {}",
                "•".cyan(),
                case.name,
                format!("({})", tags.join(", ")).dimmed()
            );
            if let Some(description) = &case.description {
                println!("      {}", description.dimmed());
            }
        }
        CaseEntry::Invalid { name, error, .. } => {
            println!("  {} {}", "✗".red(), name.white().bold());
            println!("      {}", error.to_string().red());
        }
    }
}
