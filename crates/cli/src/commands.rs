//! Clap command tree definition.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("optimist")
        .about("Drive concurrent optimistic updates against an in-memory store")
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log every conflict (overrides RUST_LOG)")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(build_contend())
        .subcommand(
            Command::new("config").about("Print the default optimist.toml to stdout"),
        )
}

fn build_contend() -> Command {
    Command::new("contend")
        .about("Run N callers that each increment one shared counter record")
        .arg(
            Arg::new("callers")
                .short('n')
                .long("callers")
                .help("Concurrent callers (threads)")
                .value_parser(value_parser!(usize))
                .default_value("10"),
        )
        .arg(
            Arg::new("increments")
                .short('k')
                .long("increments")
                .help("Updates issued by each caller")
                .value_parser(value_parser!(usize))
                .default_value("1"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Read retry settings from an optimist.toml file"),
        )
        .arg(
            Arg::new("max-retries")
                .long("max-retries")
                .help("Conflict retries per update")
                .value_parser(value_parser!(usize))
                .conflicts_with("unbounded"),
        )
        .arg(
            Arg::new("unbounded")
                .long("unbounded")
                .help("Retry conflicts until the write commits")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("base-delay-ms")
                .long("base-delay-ms")
                .help("Base backoff delay in milliseconds")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("max-delay-ms")
                .long("max-delay-ms")
                .help("Backoff ceiling in milliseconds")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("no-jitter")
                .long("no-jitter")
                .help("Sleep the full backoff instead of a random share of it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .help("Per-update timeout in milliseconds")
                .value_parser(value_parser!(u64)),
        )
}
