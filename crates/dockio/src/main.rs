mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "dockio",
    version,
    about = "Decode container-engine response streams"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). Overridden by DOCKIO_LOG.
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_demux_subcommand() {
        let cli = Cli::try_parse_from(["dockio", "demux", "logs.bin", "--split"])
            .expect("demux args should parse");

        match cli.command {
            Command::Demux(args) => assert!(args.split),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_json_collect_with_event() {
        let cli = Cli::try_parse_from([
            "dockio", "json", "pull.json", "--collect", "--event", "progress",
        ])
        .expect("json args should parse");

        match cli.command {
            Command::Json(args) => {
                assert!(args.collect);
                assert_eq!(args.event, "progress");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "dockio", "mux", "--data", "hello", "--file", "/tmp/payload",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["dockio", "frames", "-", "--format", "pretty"])
            .expect("global flag should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Pretty)));
    }
}
