//! Clap command tree definition.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("frostline")
        .about("Archive, thaw and flush search buckets")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Config file (default: ./frostline.toml)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Debug logging (overrides RUST_LOG)")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("init").about("Write a default config file if none exists"))
        .subcommand(
            Command::new("freeze")
                .about("Take over a frozen bucket and archive it")
                .arg(index_arg())
                .arg(bucket_arg()),
        )
        .subcommand(
            Command::new("archive")
                .about("Archive a bucket directory in place")
                .arg(index_arg())
                .arg(bucket_arg()),
        )
        .subcommand(Command::new("recover").about("Retry buckets whose archival failed"))
        .subcommand(
            Command::new("thaw")
                .about("Restore archived buckets overlapping a time range")
                .arg(index_arg())
                .arg(time_arg("earliest"))
                .arg(time_arg("latest")),
        )
        .subcommand(
            Command::new("flush")
                .about("Remove thawed buckets outside a retained time range")
                .arg(index_arg())
                .arg(time_arg("earliest"))
                .arg(time_arg("latest")),
        )
        .subcommand(
            Command::new("list")
                .about("List archived indexes, or the buckets of one index")
                .arg(
                    Arg::new("index")
                        .long("index")
                        .short('i')
                        .help("Index to list buckets of"),
                ),
        )
}

fn index_arg() -> Arg {
    Arg::new("index").required(true).help("Index name")
}

fn bucket_arg() -> Arg {
    Arg::new("bucket")
        .required(true)
        .help("Bucket directory (db_<latest>_<earliest>_<id>)")
}

fn time_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(i64))
        .help("Epoch seconds, inclusive")
}
