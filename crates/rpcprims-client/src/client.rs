use std::collections::BTreeMap;
use std::time::Duration;

use rpcprims_transport::{TcpEndpoint, TransportError, DEFAULT_PORT};
use rpcprims_wire::{
    catalog_from_value, decode_value, encode_request, FrameConfig, FrameReader, FrameWriter,
    Kwargs, Protocol, Request, Value, DEFAULT_MAX_PAYLOAD, DISCOVERY_COMMAND,
};
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::stub::Stub;

/// Names already taken on the client surface. A discovered operation that
/// collides with one is skipped, with a warning, rather than shadowing it.
const RESERVED_STUB_NAMES: &[&str] = &["call", "config", "connect", "connect_to", "stub", "stubs"];

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host to connect to.
    pub server: String,
    /// Server port. Defaults to 62000.
    pub port: u16,
    /// Payload serialization protocol; must match the server's.
    pub protocol: Protocol,
    /// Timeout for establishing each per-call connection.
    pub connect_timeout: Option<Duration>,
    /// Read timeout on established connections.
    pub read_timeout: Option<Duration>,
    /// Write timeout on established connections.
    pub write_timeout: Option<Duration>,
    /// Maximum frame payload size.
    pub max_payload_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1".to_owned(),
            port: DEFAULT_PORT,
            protocol: Protocol::default(),
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// A connected client with stubs for the operations discovered at
/// construction.
///
/// The stub set is a one-shot snapshot: it is generated when `connect`
/// succeeds and never refreshed. Operations the server gains later are still
/// reachable by name through [`RpcClient::call`]; they just have no stub.
#[derive(Debug)]
pub struct RpcClient {
    config: ClientConfig,
    stubs: BTreeMap<String, Stub>,
}

impl RpcClient {
    /// Discover the server's operations and build one stub per descriptor.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let mut client = Self {
            config,
            stubs: BTreeMap::new(),
        };

        let catalog_value = client.call(DISCOVERY_COMMAND, &[], &Kwargs::new())?;
        let catalog = catalog_from_value(&catalog_value)?;

        for descriptor in catalog {
            if RESERVED_STUB_NAMES.contains(&descriptor.name.as_str()) {
                warn!(name = %descriptor.name, "operation collides with client surface; skipping stub");
                continue;
            }
            if client.stubs.contains_key(&descriptor.name) {
                warn!(name = %descriptor.name, "duplicate operation name; keeping first stub");
                continue;
            }
            debug!(name = %descriptor.name, "creating stub");
            let stub = Stub::new(descriptor, client.config.clone());
            client.stubs.insert(stub.name().to_owned(), stub);
        }

        info!(
            server = %client.config.server,
            port = client.config.port,
            stubs = client.stubs.len(),
            "connected"
        );
        Ok(client)
    }

    /// Connect to `server:port` with default configuration otherwise.
    pub fn connect_to(server: &str, port: u16) -> Result<Self> {
        Self::connect(ClientConfig {
            server: server.to_owned(),
            port,
            ..ClientConfig::default()
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The stub generated for `name`, if discovery produced one.
    pub fn stub(&self, name: &str) -> Option<&Stub> {
        self.stubs.get(name)
    }

    /// All generated stubs, name-sorted.
    pub fn stubs(&self) -> impl Iterator<Item = &Stub> {
        self.stubs.values()
    }

    /// The generic call path. Reaches any operation by name, stub or not.
    pub fn call(&self, command: &str, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        call_with_config(&self.config, command, args, kwargs)
    }
}

/// One complete call: connect, send the framed request, read one framed
/// value, close. A decoded error value becomes the call's failure.
pub(crate) fn call_with_config(
    config: &ClientConfig,
    command: &str,
    args: &[Value],
    kwargs: &Kwargs,
) -> Result<Value> {
    debug!(
        command,
        server = %config.server,
        port = config.port,
        "remote call"
    );

    let request = Request {
        command: command.to_owned(),
        args: args.to_vec(),
        kwargs: kwargs.clone(),
    };
    let bytes = encode_request(&request, config.protocol)?;

    let stream = TcpEndpoint::connect(&config.server, config.port, config.connect_timeout)?;
    let reader_stream = stream.try_clone().map_err(TransportError::from)?;
    let frame_config = FrameConfig {
        max_payload_size: config.max_payload_size,
        read_timeout: config.read_timeout,
        write_timeout: config.write_timeout,
    };
    let mut writer = FrameWriter::with_config_tcp(stream, frame_config.clone())?;
    let mut reader = FrameReader::with_config_tcp(reader_stream, frame_config)?;

    writer.send(&bytes)?;
    let payload = reader.read_frame()?;
    debug!(command, bytes = payload.len(), "response frame");

    match decode_value(&payload, config.protocol)? {
        Value::Error(err) => {
            debug!(command, error = %err, "remote error");
            Err(ClientError::Remote(err))
        }
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    use rpcprims_wire::{
        catalog_to_value, decode_request, encode_value, ErrorValue, OperationDescriptor,
        WireError, KIND_OPERATION_NOT_FOUND,
    };

    use super::*;

    /// A scripted one-request-per-connection responder.
    fn serve_script<F>(connections: usize, respond: F) -> (u16, thread::JoinHandle<()>)
    where
        F: Fn(Request) -> Value + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let join = thread::spawn(move || {
            for _ in 0..connections {
                let (stream, _) = listener.accept().unwrap();
                serve_one(stream, &respond);
            }
        });
        (port, join)
    }

    fn serve_one<F: Fn(Request) -> Value>(stream: TcpStream, respond: &F) {
        let mut reader = FrameReader::new(stream.try_clone().unwrap());
        let mut writer = FrameWriter::new(stream);
        let payload = reader.read_frame().unwrap();
        let request = decode_request(&payload, Protocol::Json).unwrap();
        let reply = respond(request);
        writer
            .send(&encode_value(&reply, Protocol::Json).unwrap())
            .unwrap();
    }

    fn fixture_catalog() -> Vec<OperationDescriptor> {
        vec![
            OperationDescriptor::new("echo", "Echo a message back."),
            OperationDescriptor::new("ping", "Returns PONG."),
        ]
    }

    fn config_for(port: u16) -> ClientConfig {
        ClientConfig {
            port,
            connect_timeout: Some(Duration::from_secs(2)),
            read_timeout: Some(Duration::from_secs(2)),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn connect_discovers_and_builds_stubs() {
        let (port, join) = serve_script(1, |request| {
            assert_eq!(request.command, DISCOVERY_COMMAND);
            catalog_to_value(&fixture_catalog())
        });

        let client = RpcClient::connect(config_for(port)).unwrap();
        join.join().unwrap();

        let names: Vec<_> = client.stubs().map(Stub::name).collect();
        assert_eq!(names, vec!["echo", "ping"]);
        assert_eq!(
            client.stub("echo").unwrap().doc(),
            "Echo a message back."
        );
        assert!(client.stub("parrot").is_none());
    }

    #[test]
    fn colliding_and_duplicate_names_skipped() {
        let (port, join) = serve_script(1, |_| {
            catalog_to_value(&[
                OperationDescriptor::new("call", "Shadows the client API."),
                OperationDescriptor::new("echo", "Echo a message back."),
                OperationDescriptor::new("echo", "Late duplicate."),
            ])
        });

        let client = RpcClient::connect(config_for(port)).unwrap();
        join.join().unwrap();

        assert!(client.stub("call").is_none());
        let names: Vec<_> = client.stubs().map(Stub::name).collect();
        assert_eq!(names, vec!["echo"]);
        // First registration wins.
        assert_eq!(client.stub("echo").unwrap().doc(), "Echo a message back.");
    }

    #[test]
    fn stub_invoke_forwards_arguments() {
        let (port, join) = serve_script(2, |request| match request.command.as_str() {
            DISCOVERY_COMMAND => catalog_to_value(&fixture_catalog()),
            "echo" => {
                let message = request.args.first().and_then(Value::as_str).unwrap();
                Value::from(format!("I received: {message}"))
            }
            other => panic!("unexpected command {other}"),
        });

        let client = RpcClient::connect(config_for(port)).unwrap();
        let reply = client
            .stub("echo")
            .unwrap()
            .invoke(&[Value::from("Marco")], &Kwargs::new())
            .unwrap();
        join.join().unwrap();

        assert_eq!(reply, Value::from("I received: Marco"));
    }

    #[test]
    fn remote_error_surfaces_with_kind_and_message() {
        let (port, join) = serve_script(2, |request| match request.command.as_str() {
            DISCOVERY_COMMAND => catalog_to_value(&fixture_catalog()),
            _ => Value::Error(ErrorValue::new(KIND_OPERATION_NOT_FOUND, "no such operation: parrot")),
        });

        let client = RpcClient::connect(config_for(port)).unwrap();
        let err = client
            .call("parrot", &[], &Kwargs::new())
            .unwrap_err();
        join.join().unwrap();

        let remote = err.as_remote().expect("remote error");
        assert_eq!(remote.kind, KIND_OPERATION_NOT_FOUND);
        assert_eq!(remote.message, "no such operation: parrot");
    }

    #[test]
    fn call_reaches_operations_without_stubs() {
        let (port, join) = serve_script(2, |request| match request.command.as_str() {
            DISCOVERY_COMMAND => catalog_to_value(&fixture_catalog()),
            "late_op" => Value::from("still reachable"),
            other => panic!("unexpected command {other}"),
        });

        let client = RpcClient::connect(config_for(port)).unwrap();
        assert!(client.stub("late_op").is_none());
        let reply = client.call("late_op", &[], &Kwargs::new()).unwrap();
        join.join().unwrap();

        assert_eq!(reply, Value::from("still reachable"));
    }

    #[test]
    fn malformed_catalog_is_a_wire_error() {
        let (port, join) = serve_script(1, |_| Value::from("not a catalog"));

        let err = RpcClient::connect(config_for(port)).unwrap_err();
        join.join().unwrap();

        assert!(matches!(
            err,
            ClientError::Wire(WireError::Catalog { .. })
        ));
    }

    #[test]
    fn connect_failure_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = RpcClient::connect(config_for(port)).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn each_call_uses_a_fresh_connection() {
        let (port, join) = serve_script(3, |request| match request.command.as_str() {
            DISCOVERY_COMMAND => catalog_to_value(&fixture_catalog()),
            "ping" => Value::from("PONG"),
            other => panic!("unexpected command {other}"),
        });

        let client = RpcClient::connect(config_for(port)).unwrap();
        // Two calls after discovery: three accepted connections in total.
        assert_eq!(
            client.call("ping", &[], &Kwargs::new()).unwrap(),
            Value::from("PONG")
        );
        assert_eq!(
            client.call("ping", &[], &Kwargs::new()).unwrap(),
            Value::from("PONG")
        );
        join.join().unwrap();
    }
}
