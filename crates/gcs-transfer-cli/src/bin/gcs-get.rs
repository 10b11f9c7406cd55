//! Download an object and save it to a local file

use anyhow::Result;
use clap::Parser;
use gcs_transfer::Client;
use gcs_transfer_cli::{execute, CommonArgs, Invocation, Progress};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "gcs-get")]
#[command(author, version, about = "Download an object from cloud storage and save it locally", long_about = None)]
#[command(after_help = "Credentials come from the provider's environment \
    (for Google Cloud see 'gcloud auth application-default login').")]
struct Cli {
    /// Bucket to read from
    #[arg(short, long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    bucket: String,

    /// Object key to download
    #[arg(short, long = "google_filename", value_parser = clap::builder::NonEmptyStringValueParser::new())]
    google_filename: String,

    /// Local file to save the object into
    #[arg(short, long = "output_filename")]
    output_filename: PathBuf,

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

fn get(progress: &Progress<'_>, cli: &Cli, client: &mut Client) -> Result<()> {
    progress.step(format!(
        "Reading google file '{}' from bucket '{}'",
        cli.google_filename, cli.bucket
    ));
    let buffer = client.read_object(&cli.bucket, &cli.google_filename)?;

    progress.step(format!(
        "Saving file of length {} to local file '{}'",
        buffer.len(),
        cli.output_filename.display()
    ));
    client.save_file(&cli.output_filename, &buffer)?;
    Ok(())
}

fn main() {
    let code = execute::<Cli, _>("gcs-get", std::env::args_os().collect(), get);
    process::exit(code);
}
