use std::process;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use aha_claude::app;
use aha_claude::button::Status;
use aha_claude::cli::Args;
use aha_claude::Error;

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match app::run(args) {
        Ok(Status::Error) => process::exit(1),
        Ok(_) => {}
        Err(Error::Cancelled) => process::exit(1),
        Err(err) => {
            eprintln!("{} {}", "x".red(), err);
            process::exit(1);
        }
    }
}

/// Log to stderr, `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "aha_claude=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
