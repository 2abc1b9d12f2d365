use std::time::Duration;

use clap::{Args, Subcommand};
use rpcprims_transport::DEFAULT_PORT;
use rpcprims_wire::Protocol;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod call;
pub mod ops;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the built-in demonstration registry.
    Serve(ServeArgs),
    /// Invoke a remote operation and print its result.
    Call(CallArgs),
    /// Discover and print a server's operation catalog.
    Ops(OpsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Call(args) => call::run(args, format),
        Command::Ops(args) => ops::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    /// Port to bind.
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Serialization protocol number (1 = json, 2 = msgpack).
    #[arg(long, default_value_t = 1)]
    pub protocol: u8,
    /// Stop serving after this long (e.g. 30s, 500ms). Default: run until
    /// interrupted.
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Operation to invoke.
    pub command: String,
    /// Positional arguments, parsed as JSON with a bare-string fallback.
    #[arg(value_name = "ARG")]
    pub args: Vec<String>,
    /// Server to connect to.
    #[arg(long, short = 's', default_value = "127.0.0.1")]
    pub server: String,
    /// Server port.
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Serialization protocol number; must match the server's.
    #[arg(long, default_value_t = 1)]
    pub protocol: u8,
    /// Keyword argument, repeatable.
    #[arg(long, short = 'k', value_name = "NAME=VALUE")]
    pub kwarg: Vec<String>,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
}

#[derive(Args, Debug)]
pub struct OpsArgs {
    /// Server to connect to.
    #[arg(long, short = 's', default_value = "127.0.0.1")]
    pub server: String,
    /// Server port.
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Serialization protocol number; must match the server's.
    #[arg(long, default_value_t = 1)]
    pub protocol: u8,
    /// Connection timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub connect_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_protocol(number: u8) -> CliResult<Protocol> {
    Protocol::from_number(number).ok_or_else(|| {
        CliError::new(
            USAGE,
            format!("unsupported protocol number: {number} (expected 1 or 2)"),
        )
    })
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
