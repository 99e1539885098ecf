use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use humansize::{format_size, DECIMAL};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3deploy::config::{self, DeployConfig, Settings};
use s3deploy::fs::{ObjectStore, S3Store};
use s3deploy::sync::{SyncEngine, SyncEvent};

/// Deploy a local directory tree to an S3 bucket
#[derive(Parser, Debug)]
#[command(name = "s3deploy", version, about)]
struct Args {
    /// Extra config file, applied after the global and project files
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Local directory to deploy (overrides `path`)
    #[arg(long, global = true)]
    path: Option<String>,

    /// Key prefix inside the bucket (overrides `remote_path`)
    #[arg(long, global = true)]
    remote_path: Option<String>,

    /// Log engine internals to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload changed files, optionally pruning stale objects
    Deploy {
        /// Report decisions without changing the bucket
        #[arg(short, long)]
        simulate: bool,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every object in the bucket
    Empty {
        /// Report deletions without changing the bucket
        #[arg(short, long)]
        simulate: bool,
    },
    /// Write a template configuration file
    Install {
        /// Install to ~/.s3deploy instead of the current directory
        #[arg(long)]
        global: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "s3deploy=debug" } else { "s3deploy=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Returns whether every item succeeded.
async fn run(args: Args) -> Result<bool> {
    let (simulate, json, emptying) = match args.command {
        Command::Install { global } => {
            let target = config::install_template(global)?;
            println!("A configuration file has been created at {}", target.display());
            return Ok(true);
        }
        Command::Deploy { simulate, json } => (simulate, json, false),
        Command::Empty { simulate } => (simulate, false, true),
    };

    if args.config.is_none() && !config::config_files_present() {
        eprintln!(
            "{} no configuration found, run `s3deploy install` to create one",
            "Warning:".yellow().bold()
        );
    }

    let mut settings = Settings::discover(args.config.as_deref())?;
    if args.path.is_some() {
        settings.path = args.path;
    }
    if args.remote_path.is_some() {
        settings.remote_path = args.remote_path;
    }
    let DeployConfig { sync, remote } = settings.resolve()?;

    let store = Arc::new(S3Store::new(&remote).context("Failed to open bucket")?);
    let target = store.display_path(&sync.remote_prefix);
    let engine =
        SyncEngine::new(store, sync).with_event_callback(move |event| print_event(event, json));

    let cancel = engine.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping after the current file".yellow());
            cancel.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });

    if emptying {
        let suffix = if simulate { " (Simulating)" } else { "" };
        println!("Emptying {}{}", remote.bucket, suffix);
        let report = engine.empty(simulate).await?;
        println!(
            "\n{} deleted, {} failed",
            report.deleted.len(),
            report.failures.len()
        );
        return Ok(report.is_success());
    }

    if simulate {
        say(json, format!("Simulating deployment to {}", target));
    } else {
        say(json, format!("Deploying to {}", target));
    }

    let report = engine.sync(simulate).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "\n{} uploaded ({}), {} skipped, {} deleted, {} failed",
            report.uploaded(),
            format_size(report.bytes_uploaded, DECIMAL),
            report.skipped(),
            report.deleted(),
            report.failures.len()
        );
    }

    Ok(report.is_success())
}

/// Output stream for a line; with `--json`, stdout carries only the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

fn event_stream(event: &SyncEvent<'_>, json: bool) -> Stream {
    match event {
        SyncEvent::Decision(_) if !json => Stream::Stdout,
        _ => Stream::Stderr,
    }
}

fn say(json: bool, line: String) {
    if json {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

fn print_event(event: SyncEvent<'_>, json: bool) {
    let line = match event {
        SyncEvent::Decision(decision) => decision.to_string(),
        SyncEvent::Failure(failure) => failure.to_string().red().to_string(),
    };
    match event_stream(&event, json) {
        Stream::Stdout => println!("{}", line),
        Stream::Stderr => eprintln!("{}", line),
    }
}
