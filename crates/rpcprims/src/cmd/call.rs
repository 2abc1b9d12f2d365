use rpcprims_client::{ClientConfig, RpcClient};
use rpcprims_wire::{decode_value, Kwargs, Protocol, Value};

use crate::cmd::{parse_duration, parse_protocol, CallArgs};
use crate::exit::{client_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_result, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let protocol = parse_protocol(args.protocol)?;
    let connect_timeout = parse_duration(&args.connect_timeout)?;

    let positional: Vec<Value> = args.args.iter().map(|raw| parse_value_arg(raw)).collect();
    let mut kwargs = Kwargs::new();
    for raw in &args.kwarg {
        let (name, value) = parse_kwarg(raw)?;
        kwargs.insert(name, value);
    }

    let config = ClientConfig {
        server: args.server,
        port: args.port,
        protocol,
        connect_timeout: Some(connect_timeout),
        ..ClientConfig::default()
    };
    let client = RpcClient::connect(config).map_err(|err| client_error("connect failed", err))?;

    let result = client
        .call(&args.command, &positional, &kwargs)
        .map_err(|err| client_error("call failed", err))?;

    print_result(&args.command, &result, format);
    Ok(SUCCESS)
}

/// Parse one positional argument: JSON first, bare string as fallback, so
/// `42`, `true`, and `'{"a":1}'` arrive typed while `Marco` stays a string.
fn parse_value_arg(raw: &str) -> Value {
    decode_value(raw.as_bytes(), Protocol::Json).unwrap_or_else(|_| Value::Str(raw.to_owned()))
}

fn parse_kwarg(raw: &str) -> CliResult<(String, Value)> {
    let (name, value) = raw.split_once('=').ok_or_else(|| {
        CliError::new(USAGE, format!("invalid --kwarg {raw:?} (expected NAME=VALUE)"))
    })?;
    if name.is_empty() {
        return Err(CliError::new(
            USAGE,
            format!("invalid --kwarg {raw:?} (empty name)"),
        ));
    }
    Ok((name.to_owned(), parse_value_arg(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_args_parse_as_json_with_string_fallback() {
        assert_eq!(parse_value_arg("42"), Value::from(42));
        assert_eq!(parse_value_arg("true"), Value::from(true));
        assert_eq!(parse_value_arg("\"Marco\""), Value::from("Marco"));
        assert_eq!(parse_value_arg("Marco"), Value::from("Marco"));
        assert_eq!(parse_value_arg("null"), Value::Null);

        let list = parse_value_arg("[1, 2]");
        assert_eq!(list.as_list().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn kwargs_split_on_first_equals() {
        let (name, value) = parse_kwarg("food=cake").unwrap();
        assert_eq!(name, "food");
        assert_eq!(value, Value::from("cake"));

        let (name, value) = parse_kwarg("expr=a=b").unwrap();
        assert_eq!(name, "expr");
        assert_eq!(value, Value::from("a=b"));

        let (_, value) = parse_kwarg("count=3").unwrap();
        assert_eq!(value, Value::from(3));
    }

    #[test]
    fn malformed_kwargs_are_usage_errors() {
        assert_eq!(parse_kwarg("no-equals").unwrap_err().code, USAGE);
        assert_eq!(parse_kwarg("=value").unwrap_err().code, USAGE);
    }
}
