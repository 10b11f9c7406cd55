//! Upload a local file as an object

use anyhow::Result;
use clap::Parser;
use gcs_transfer::Client;
use gcs_transfer_cli::{execute, CommonArgs, Invocation, Progress};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "gcs-put")]
#[command(author, version, about = "Upload a local file to cloud storage", long_about = None)]
#[command(after_help = "Credentials come from the provider's environment \
    (for Google Cloud see 'gcloud auth application-default login').")]
struct Cli {
    /// Bucket to write to
    #[arg(short, long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    bucket: String,

    /// Object key to create or replace
    #[arg(short, long = "google_filename", value_parser = clap::builder::NonEmptyStringValueParser::new())]
    google_filename: String,

    /// Local file to upload
    #[arg(short, long = "input_filename")]
    input_filename: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

impl Invocation for Cli {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn bucket(&self) -> Option<&str> {
        Some(&self.bucket)
    }
}

fn put(progress: &Progress<'_>, cli: &Cli, client: &mut Client) -> Result<()> {
    progress.step(format!(
        "Loading file from local file '{}'",
        cli.input_filename.display()
    ));
    let data = client.load_file(&cli.input_filename)?;

    progress.step(format!(
        "Saving local file contents to google file '{}' in bucket '{}'",
        cli.google_filename, cli.bucket
    ));
    let receipt = client.write_object(&cli.bucket, &cli.google_filename, &data)?;
    tracing::info!(size = receipt.size, "Object committed");
    Ok(())
}

fn main() {
    let code = execute::<Cli, _>("gcs-put", std::env::args_os().collect(), put);
    process::exit(code);
}
