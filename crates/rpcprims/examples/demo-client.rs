//! Minimal RPC client — discovers a server's operations and calls them.
//!
//! Start the server first:
//!   cargo run --example demo-server --features server
//!
//! Then run:
//!   cargo run --example demo-client --features client

use std::time::Duration;

use rpcprims::client::{ClientConfig, RpcClient};
use rpcprims::wire::{Kwargs, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig {
        connect_timeout: Some(Duration::from_secs(3)),
        ..ClientConfig::default()
    };
    let client = RpcClient::connect(config)?;

    eprintln!("Discovered operations:");
    for stub in client.stubs() {
        let first_line = stub.doc().lines().next().unwrap_or("");
        eprintln!("  {}: {first_line}", stub.name());
    }

    // Stubs carry the catalog entry and forward calls by name.
    if let Some(echo) = client.stub("echo") {
        let reply = echo.invoke(&[Value::from("Marco")], &Kwargs::new())?;
        eprintln!("echo -> {reply:?}");
    }

    // The generic call path reaches any operation, stub or not.
    let mut kwargs = Kwargs::new();
    kwargs.insert("food".to_owned(), Value::from("cake"));
    kwargs.insert("effect".to_owned(), Value::from("delicious"));
    let reply = client.call("story", &[], &kwargs)?;
    eprintln!("story -> {reply:?}");

    // Attributes answer with their stored value.
    let reply = client.call("name", &[], &Kwargs::new())?;
    eprintln!("name -> {reply:?}");

    // Remote failures come back as errors, not panics.
    match client.call("raise_exception", &[], &Kwargs::new()) {
        Ok(value) => eprintln!("raise_exception -> {value:?}"),
        Err(err) => match err.as_remote() {
            Some(remote) => eprintln!("raise_exception -> remote error: {remote}"),
            None => return Err(err.into()),
        },
    }

    Ok(())
}
