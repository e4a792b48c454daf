//! Optimist CLI: drive concurrent optimistic updates from the shell.
//!
//! - `optimist contend -n 10 -k 1`: N callers increment one counter record
//! - `optimist config`: print the default `optimist.toml`
//!
//! Exit status is 0 when every increment committed, 1 when some updates
//! failed or the run could not start, and 2 if the final record does not
//! account for exactly the committed updates.

mod commands;
mod contend;
mod format;

use std::process;

use tracing_subscriber::EnvFilter;

use optimist_concurrency::UpdaterConfig;

use commands::build_cli;
use contend::ContendSettings;
use format::{format_error, format_report, OutputMode};

fn main() {
    let matches = build_cli().get_matches();

    let filter = if matches.get_flag("verbose") {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match matches.subcommand() {
        Some(("config", _)) => {
            print!("{}", UpdaterConfig::default_toml());
        }
        Some(("contend", sub)) => {
            let report = match ContendSettings::from_matches(sub).and_then(|s| contend::run(&s)) {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("{}", format_error(&e, output_mode));
                    process::exit(1);
                }
            };
            println!("{}", format_report(&report, output_mode));
            if !report.is_consistent() {
                eprintln!("final record does not match committed updates");
                process::exit(2);
            }
            if !report.is_complete() {
                process::exit(1);
            }
        }
        _ => unreachable!("subcommand_required"),
    }
}
