mod autofill;
mod cli;
mod config;
mod deferred;
mod http;
mod intent;
mod location;
mod market;
mod model;
mod service;
mod shell;
mod speech;
mod storage;
mod submission;
mod telemetry;
mod voice;
mod weather;

use std::process;

use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();

    let log_file = telemetry::trace_log_path(cli.log_file.as_deref(), |key| {
        std::env::var(key).ok()
    });
    telemetry::init(cli.verbose, log_file.as_deref());

    if let Err(e) = cli::run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
