use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Well-known default port for rpcprims servers.
pub const DEFAULT_PORT: u16 = 62000;

/// A bound, listening TCP endpoint.
///
/// The listener is kept nonblocking so accepts can be bounded; accepted
/// streams are switched back to blocking before they are handed out.
pub struct TcpEndpoint {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpEndpoint {
    /// Bind and listen on `host:port`.
    ///
    /// Port 0 binds an ephemeral port; the actual address is available via
    /// [`TcpEndpoint::local_addr`].
    pub fn bind(host: &str, port: u16) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: addr.clone(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.clone(),
            source: e,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|e| TransportError::Bind { addr, source: e })?;

        info!(%local_addr, "listening on tcp");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// The address this endpoint is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait up to `timeout` for one incoming connection.
    ///
    /// Returns `Ok(None)` when the wait elapses without a connection, so a
    /// serve loop can re-check its stop condition between waits. A signal
    /// arriving during the wait is reported the same way.
    pub fn accept_timeout(&self, timeout: Duration) -> Result<Option<TcpStream>> {
        #[cfg(unix)]
        {
            if !self.wait_readable(timeout)? {
                return Ok(None);
            }
            self.try_accept()
        }

        #[cfg(not(unix))]
        {
            const TICK: Duration = Duration::from_millis(25);
            let deadline = std::time::Instant::now() + timeout;
            loop {
                if let Some(stream) = self.try_accept()? {
                    return Ok(Some(stream));
                }
                if std::time::Instant::now() >= deadline {
                    return Ok(None);
                }
                std::thread::sleep(TICK.min(timeout));
            }
        }
    }

    /// One nonblocking accept attempt.
    fn try_accept(&self) -> Result<Option<TcpStream>> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                stream
                    .set_nonblocking(false)
                    .map_err(TransportError::Accept)?;
                debug!(%peer, "accepted connection");
                Ok(Some(stream))
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    #[cfg(unix)]
    fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        use std::os::fd::AsRawFd;

        let mut fds = libc::pollfd {
            fd: self.listener.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;

        // SAFETY: `fds` is a valid pollfd for the duration of the call, and
        // the descriptor is the open listener owned by `self`.
        let rc = unsafe { libc::poll(&mut fds, 1, millis) };

        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == ErrorKind::Interrupted {
                // Treat a signal like an elapsed wait; the caller re-checks
                // its stop condition.
                return Ok(false);
            }
            return Err(TransportError::Accept(err));
        }
        Ok(rc > 0 && fds.revents & libc::POLLIN != 0)
    }

    /// Open a new connection to `host:port` (blocking).
    ///
    /// With a timeout, each resolved address is tried with that limit;
    /// without one, the platform's connect behavior applies.
    pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<TcpStream> {
        let addr = format!("{host}:{port}");
        let stream = match timeout {
            None => TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
                addr: addr.clone(),
                source: e,
            })?,
            Some(limit) => {
                let candidates = addr
                    .to_socket_addrs()
                    .map_err(|e| TransportError::Connect {
                        addr: addr.clone(),
                        source: e,
                    })?;
                let mut last_err = None;
                let mut connected = None;
                for candidate in candidates {
                    match TcpStream::connect_timeout(&candidate, limit) {
                        Ok(stream) => {
                            connected = Some(stream);
                            break;
                        }
                        Err(err) => last_err = Some(err),
                    }
                }
                match connected {
                    Some(stream) => stream,
                    None => {
                        return Err(TransportError::Connect {
                            addr,
                            source: last_err.unwrap_or_else(|| {
                                std::io::Error::new(
                                    ErrorKind::AddrNotAvailable,
                                    "no addresses resolved",
                                )
                            }),
                        })
                    }
                }
            }
        };
        debug!(%addr, "connected");
        Ok(stream)
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}
