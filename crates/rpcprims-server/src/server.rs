use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rpcprims_transport::{TcpEndpoint, DEFAULT_PORT};
use rpcprims_wire::{
    catalog_to_value, decode_request, encode_value, ErrorValue, FrameConfig, FrameReader,
    FrameWriter, Protocol, Request, Value, DEFAULT_MAX_PAYLOAD, DISCOVERY_COMMAND,
};
use tracing::{debug, info, warn};

use crate::error::{InvokeError, Result};
use crate::handler::Handler;

/// How long one accept wait lasts before the loop re-checks its stop
/// condition.
pub const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind. Defaults to all interfaces.
    pub host: String,
    /// Port to bind. Defaults to 62000; 0 binds an ephemeral port.
    pub port: u16,
    /// Payload serialization protocol; must match the clients'.
    pub protocol: Protocol,
    /// Upper bound of one accept wait.
    pub accept_timeout: Duration,
    /// Read timeout applied to accepted connections.
    pub read_timeout: Option<Duration>,
    /// Write timeout applied to accepted connections.
    pub write_timeout: Option<Duration>,
    /// Maximum frame payload size.
    pub max_payload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: DEFAULT_PORT,
            protocol: Protocol::default(),
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
            read_timeout: None,
            write_timeout: None,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Cross-thread view of a server: observe liveness, read the bound address,
/// request a stop.
#[derive(Debug, Clone, Default)]
pub struct ServerHandle {
    running: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    local_addr: Arc<Mutex<Option<SocketAddr>>>,
}

impl ServerHandle {
    /// True exactly while the serve loop is live: set after a successful
    /// bind, cleared before [`RpcServer::run`] returns.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the serve loop to exit. Honored between connections; an in-flight
    /// request is always finished first.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// The address the server last bound, once it has. Useful with port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The serve loop: accept one connection, service it fully, repeat.
///
/// Single-threaded and synchronous. Per-request failures are converted to
/// error values and answered; only a failed bind aborts [`RpcServer::run`].
pub struct RpcServer<H> {
    handler: H,
    config: ServerConfig,
    handle: ServerHandle,
}

impl<H: Handler> RpcServer<H> {
    /// A server with default configuration.
    pub fn new(handler: H) -> Self {
        Self::with_config(handler, ServerConfig::default())
    }

    pub fn with_config(handler: H, config: ServerConfig) -> Self {
        Self {
            handler,
            config,
            handle: ServerHandle::default(),
        }
    }

    /// A handle that stays valid across threads while `run` blocks.
    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Serve until `timeout` elapses or [`ServerHandle::stop`] is called.
    ///
    /// `None` and zero both mean no deadline. The deadline is wall-clock
    /// from entry; because stop conditions are checked between connections,
    /// return may lag the deadline by up to one accept wait plus one
    /// in-flight request.
    pub fn run(&mut self, timeout: Option<Duration>) -> Result<()> {
        let deadline = match timeout {
            Some(limit) if !limit.is_zero() => Some(Instant::now() + limit),
            _ => None,
        };

        let endpoint = TcpEndpoint::bind(&self.config.host, self.config.port)?;
        let local_addr = endpoint.local_addr();
        info!(
            addr = %local_addr,
            protocol = %self.config.protocol,
            operations = self.handler.operations().len(),
            "serving"
        );

        *self
            .handle
            .local_addr
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(local_addr);
        self.handle.running.store(true, Ordering::SeqCst);
        let outcome = self.serve_loop(&endpoint, deadline);
        self.handle.running.store(false, Ordering::SeqCst);

        info!(addr = %local_addr, "stopped");
        outcome
    }

    fn serve_loop(&mut self, endpoint: &TcpEndpoint, deadline: Option<Instant>) -> Result<()> {
        loop {
            if self.handle.stop_requested() {
                debug!("stop requested");
                return Ok(());
            }

            let wait = match deadline {
                None => self.config.accept_timeout,
                Some(at) => {
                    let remaining = at.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        debug!("deadline reached");
                        return Ok(());
                    }
                    remaining.min(self.config.accept_timeout)
                }
            };

            let stream = match endpoint.accept_timeout(wait) {
                // Elapsed wait: routine, loop back to the stop checks.
                Ok(None) => continue,
                Ok(Some(stream)) => stream,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    continue;
                }
            };

            if let Err(err) = self.service_connection(stream) {
                // Connection-level failures never stop the loop.
                warn!(error = %err, "connection abandoned");
            }
        }
    }

    /// One full connection: read one request, answer it, done.
    fn service_connection(&mut self, stream: TcpStream) -> rpcprims_wire::Result<()> {
        let frame_config = FrameConfig {
            max_payload_size: self.config.max_payload_size,
            read_timeout: self.config.read_timeout,
            write_timeout: self.config.write_timeout,
        };
        let reader_stream = stream.try_clone()?;
        let mut reader = FrameReader::with_config_tcp(reader_stream, frame_config.clone())?;
        let mut writer = FrameWriter::with_config_tcp(stream, frame_config)?;

        let payload = reader.read_frame()?;
        debug!(bytes = payload.len(), "request frame");

        let request = match decode_request(&payload, self.config.protocol) {
            Ok(request) => request,
            Err(err) => {
                // Undecodable request: drop the connection unanswered.
                warn!(error = %err, "request decode failed; dropping connection");
                return Ok(());
            }
        };
        debug!(
            command = %request.command,
            args = request.args.len(),
            kwargs = request.kwargs.len(),
            "dispatching"
        );

        let reply = self.execute(&request);
        let bytes = match encode_value(&reply, self.config.protocol) {
            Ok(bytes) => bytes,
            Err(err) => {
                // The operation produced a value the protocol cannot carry;
                // report that as the call's failure. Error values themselves
                // always encode.
                warn!(command = %request.command, error = %err, "result not encodable");
                let fallback = Value::Error(ErrorValue::operation_failed(format!(
                    "result not encodable: {err}"
                )));
                encode_value(&fallback, self.config.protocol)?
            }
        };
        writer.send(&bytes)?;
        debug!(command = %request.command, bytes = bytes.len(), "replied");
        Ok(())
    }

    fn execute(&mut self, request: &Request) -> Value {
        if request.command == DISCOVERY_COMMAND {
            // Catalog is computed fresh on every discovery, never cached.
            return catalog_to_value(&self.handler.operations());
        }
        match self
            .handler
            .invoke(&request.command, &request.args, &request.kwargs)
        {
            Ok(value) => value,
            Err(err) => {
                match &err {
                    InvokeError::NotFound { command } => debug!(%command, "command not found"),
                    InvokeError::Failed { .. } => {
                        warn!(command = %request.command, error = %err, "operation failed")
                    }
                }
                Value::Error(err.to_error_value())
            }
        }
    }
}
