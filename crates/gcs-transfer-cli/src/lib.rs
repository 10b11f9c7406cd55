//! Shared plumbing for the `gcs-connect`, `gcs-get` and `gcs-put` front-ends
//!
//! Each binary declares its own clap arguments and a transfer step. This crate
//! handles the rest: argument normalization, configuration, logging, opening
//! the connection, error reporting and exit codes.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Args, Parser};
use gcs_transfer::{Client, Config, LogSink, LoggingConfig, SinkLayer, TransferError};
use std::ffi::OsString;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Exit code on success
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code when arguments or configuration are rejected
pub const EXIT_ARGUMENTS: i32 = 1;
/// Exit code when the connection cannot be opened
pub const EXIT_CONNECTION: i32 = 2;
/// Exit code when the object transfer fails
pub const EXIT_TRANSFER: i32 = 3;
/// Exit code when the local file cannot be read or written
pub const EXIT_LOCAL_FILE: i32 = 4;

/// Directives used when `RUST_LOG` is unset
const DEFAULT_DIRECTIVES: &str =
    "warn,gcs_transfer=trace,gcs_transfer_cli=trace,gcs_connect=trace,gcs_get=trace,gcs_put=trace";

/// Single-dash long options accepted for compatibility
const SINGLE_DASH_LONGS: [&str; 7] = [
    "-bucket",
    "-google_filename",
    "-output_filename",
    "-input_filename",
    "-log_level",
    "-config",
    "-help",
];

/// Options every front-end accepts
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Log filter level (0..5); overrides the configuration file
    #[arg(short = 'l', long = "log_level", value_parser = clap::value_parser!(i32).range(0..=5))]
    pub log_level: Option<i32>,

    /// Configuration file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// A parsed front-end command line
pub trait Invocation: Parser {
    fn common(&self) -> &CommonArgs;

    /// Bucket to resolve when the connection opens
    fn bucket(&self) -> Option<&str>;
}

/// Prints `<program> : <step>.` lines to stdout
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    program: &'a str,
}

impl<'a> Progress<'a> {
    pub fn new(program: &'a str) -> Self {
        Self { program }
    }

    pub fn step(&self, message: impl Display) {
        println!("{} : {}.", self.program, message);
    }
}

/// Rewrite single-dash long options to their `--` form
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg = arg.into();
            match arg.to_str() {
                Some(text) if SINGLE_DASH_LONGS.contains(&text) => {
                    OsString::from(format!("-{}", text))
                }
                _ => arg,
            }
        })
        .collect()
}

/// Load the configuration from `path`, or from the default location
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config file {}", path.display())),
        None => Config::load().context("Failed to load configuration"),
    }
}

/// Route `tracing` events through a stdout [`LogSink`]
pub fn setup_logging(logging: &LoggingConfig) -> LogSink {
    let sink = LogSink::stdout(logging.level, logging.filter);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // A subscriber may already be installed when called from tests.
    let _ = tracing_subscriber::registry()
        .with(SinkLayer::new(sink.clone()).with_filter(filter))
        .try_init();

    sink
}

/// Map an error to the exit code of the stage that produced it
pub fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<TransferError>() {
        Some(TransferError::Connection { .. }) => EXIT_CONNECTION,
        Some(TransferError::LocalIo { .. }) => EXIT_LOCAL_FILE,
        Some(TransferError::Config(_)) => EXIT_ARGUMENTS,
        Some(_) => EXIT_TRANSFER,
        None => EXIT_ARGUMENTS,
    }
}

fn parse_error_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayVersion => EXIT_SUCCESS,
        // Usage is printed, but help is still a rejected invocation.
        _ => EXIT_ARGUMENTS,
    }
}

/// Run a front-end and return its exit code.
///
/// Parses `args`, loads configuration, installs logging and opens the
/// connection, then hands the connected client to `transfer`.
pub fn execute<C, F>(program: &str, args: Vec<OsString>, transfer: F) -> i32
where
    C: Invocation,
    F: FnOnce(&Progress<'_>, &C, &mut Client) -> Result<()>,
{
    let progress = Progress::new(program);

    progress.step("Parsing Arguments");
    let cli = match C::try_parse_from(normalize_args(args)) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return parse_error_exit_code(&err);
        }
    };

    let mut config = match load_config(cli.common().config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} : {:#}", program, err);
            return EXIT_ARGUMENTS;
        }
    };
    if let Some(level) = cli.common().log_level {
        config.logging.level = level;
    }
    if let Some(bucket) = cli.bucket() {
        config.storage.default_bucket = Some(bucket.to_string());
    }

    progress.step("Setting up logging");
    let _sink = setup_logging(&config.logging);

    let mut client = Client::new(config);
    progress.step("Opening client connection");

    let result = client
        .open()
        .map_err(anyhow::Error::from)
        .and_then(|()| transfer(&progress, &cli, &mut client));

    match result {
        Ok(()) => {
            progress.step("finished");
            EXIT_SUCCESS
        }
        Err(err) => {
            error!("{:#}", err);
            if client.errors().is_error() {
                client.errors().report();
            } else {
                eprintln!("{} : {:#}", program, err);
            }
            map_error_to_exit_code(&err)
        }
    }
}
