mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "rpcprims", version, about = "Minimal RPC over TCP")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "RPCPRIMS_LOG_LEVEL",
        global = true
    )]
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
    fn parses_call_subcommand() {
        let cli = Cli::try_parse_from([
            "rpcprims",
            "call",
            "story",
            "--port",
            "62000",
            "--kwarg",
            "food=cake",
            "-k",
            "effect=delicious",
        ])
        .expect("call args should parse");

        let Command::Call(args) = cli.command else {
            panic!("expected call subcommand");
        };
        assert_eq!(args.command, "story");
        assert_eq!(args.kwarg, vec!["food=cake", "effect=delicious"]);
    }

    #[test]
    fn parses_serve_with_timeout() {
        let cli = Cli::try_parse_from([
            "rpcprims",
            "serve",
            "--host",
            "127.0.0.1",
            "--port",
            "0",
            "--timeout",
            "30s",
        ])
        .expect("serve args should parse");

        let Command::Serve(args) = cli.command else {
            panic!("expected serve subcommand");
        };
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.timeout.as_deref(), Some("30s"));
    }

    #[test]
    fn call_positional_args_follow_the_command() {
        let cli = Cli::try_parse_from(["rpcprims", "call", "echo", "Marco", "Polo"])
            .expect("call args should parse");

        let Command::Call(args) = cli.command else {
            panic!("expected call subcommand");
        };
        assert_eq!(args.args, vec!["Marco", "Polo"]);
        assert_eq!(args.protocol, 1);
    }

    #[test]
    fn global_flags_parse_before_the_subcommand() {
        let cli = Cli::try_parse_from(["rpcprims", "--format", "json", "ops"])
            .expect("global flags should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        assert!(matches!(cli.command, Command::Ops(_)));
    }
}
