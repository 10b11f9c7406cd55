//! Open a storage connection and report whether it succeeded

use clap::Parser;
use gcs_transfer_cli::{execute, CommonArgs, Invocation};
use std::process;

#[derive(Parser, Debug)]
#[command(name = "gcs-connect")]
#[command(author, version, about = "Open a connection to cloud object storage", long_about = None)]
#[command(after_help = "Credentials come from the provider's environment \
    (for Google Cloud see 'gcloud auth application-default login').")]
struct Cli {
    /// Bucket to resolve while opening the connection
    #[arg(short, long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    bucket: Option<String>,

    #[command(flatten)]
    common: CommonArgs,
}

impl Invocation for Cli {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }
}

fn main() {
    let code = execute::<Cli, _>("gcs-connect", std::env::args_os().collect(), |_, _, _| Ok(()));
    process::exit(code);
}
