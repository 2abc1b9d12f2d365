//! Minimal RPC server — registers a few operations and serves them.
//!
//! Run with:
//!   cargo run --example demo-server --features server
//!
//! In another terminal:
//!   cargo run --example demo-client --features client
//! or:
//!   cargo run --features cli -- call echo Marco --port 62000

use rpcprims::server::{OperationError, Registry, RpcServer, ServerConfig};
use rpcprims::wire::Value;

fn main() -> Result<(), Box<dyn std::error::Error>> {
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
        |_, kwargs| {
            let food = kwargs
                .get("food")
                .and_then(Value::as_str)
                .unwrap_or("cheese");
            let effect = kwargs
                .get("effect")
                .and_then(Value::as_str)
                .unwrap_or("moldy");
            Ok(Value::from(format!("The {food} is {effect}")))
        },
    )?;
    registry.register_operation("raise_exception", "Just raises an exception.", |_, _| {
        Err(OperationError::with_kind("not_implemented", "Foo!"))
    })?;
    registry.register_attribute("name", "foo")?;

    eprint!("{}", registry.describe());

    let config = ServerConfig {
        host: "127.0.0.1".to_owned(),
        ..ServerConfig::default()
    };
    eprintln!("Serving on {}:{} (ctrl-c to stop)", config.host, config.port);

    let mut server = RpcServer::with_config(registry, config);
    server.run(None)?;
    Ok(())
}
