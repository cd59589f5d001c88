mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "simcam", version, about = "Simulated camera tooling")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
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
    fn parses_encode_objects_subcommand() {
        let cli = Cli::try_parse_from([
            "simcam",
            "encode-objects",
            "objects.json",
            "--device",
            "3",
            "-o",
            "objects.bin",
        ])
        .expect("encode-objects args should parse");

        match cli.command {
            Command::EncodeObjects(args) => {
                assert_eq!(args.device, 3);
                assert_eq!(args.duration, 32);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn encode_objects_requires_device() {
        let err = Cli::try_parse_from(["simcam", "encode-objects", "objects.json", "-o", "x.bin"])
            .expect_err("missing --device should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_inspect_subcommand() {
        let cli = Cli::try_parse_from(["simcam", "inspect", "/tmp/host.sock", "--steps", "3"])
            .expect("inspect args should parse");
        match cli.command {
            Command::Inspect(args) => assert_eq!(args.steps, 3),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_format_after_subcommand() {
        let cli = Cli::try_parse_from(["simcam", "decode", "capture.bin", "--format", "json"])
            .expect("global flag should parse after subcommand");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.command, Command::Decode(_)));
    }
}
