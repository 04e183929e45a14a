use std::process::ExitCode;

use clap::Parser;
use text_embed::cli::{self, Args};
use text_embed::EmbedError;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();

    // stdout carries only the embedding; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli::execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(EmbedError::MissingText) = err.downcast_ref::<EmbedError>() {
                eprintln!("error: {err}");
                eprintln!("{}", cli::usage());
            } else {
                eprintln!("Error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
