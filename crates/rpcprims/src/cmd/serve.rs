use rpcprims_server::{OperationError, Registry, RpcServer, ServerConfig, ServerHandle};
use rpcprims_wire::Value;

use crate::cmd::{parse_duration, parse_protocol, ServeArgs};
use crate::exit::{server_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ServeArgs, _format: OutputFormat) -> CliResult<i32> {
    let protocol = parse_protocol(args.protocol)?;
    let timeout = args
        .timeout
        .as_deref()
        .map(parse_duration)
        .transpose()?;

    let registry = demo_registry().map_err(|err| server_error("registry setup failed", err))?;
    print!("{}", registry.describe());

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        protocol,
        ..ServerConfig::default()
    };
    let mut server = RpcServer::with_config(registry, config);
    install_ctrlc_handler(server.handle())?;

    server
        .run(timeout)
        .map_err(|err| server_error("serve failed", err))?;
    Ok(SUCCESS)
}

/// The handler served by default: the operations from the package's
/// original demonstration fixture.
fn demo_registry() -> Result<Registry, rpcprims_server::ServerError> {
    let mut registry = Registry::new();
    registry.register_operation("ping", "Returns PONG, and just for testing.", |_, _| {
        Ok(Value::from("PONG"))
    })?;
    registry.register_operation("echo", "Responds back to the caller.", |args, _| {
        let message = args.first().and_then(Value::as_str).unwrap_or_default();
        Ok(Value::from(format!("I received: {message}")))
    })?;
    registry.register_operation(
        "story",
        "Responds back to the caller with food.",
        |args, kwargs| {
            let food = kwargs
                .get("food")
                .or_else(|| args.first())
                .and_then(Value::as_str)
                .unwrap_or("cheese");
            let effect = kwargs
                .get("effect")
                .or_else(|| args.get(1))
                .and_then(Value::as_str)
                .unwrap_or("moldy");
            Ok(Value::from(format!("The {food} is {effect}")))
        },
    )?;
    registry.register_operation("raise_exception", "Just raises an exception.", |_, _| {
        Err(OperationError::with_kind("not_implemented", "Foo!"))
    })?;
    registry.register_attribute("name", "foo")?;
    Ok(registry)
}

fn install_ctrlc_handler(handle: ServerHandle) -> CliResult<()> {
    ctrlc::set_handler(move || {
        handle.stop();
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
