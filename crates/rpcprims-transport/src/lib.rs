//! TCP transport for rpcprims.
//!
//! The lowest layer of the stack: a listening endpoint with a bounded accept
//! wait on the server side, and per-call connections on the client side.
//! Streams are plain [`std::net::TcpStream`]; framing and payload handling
//! live above this crate.

pub mod error;
pub mod tcp;

pub use error::{Result, TransportError};
pub use tcp::{TcpEndpoint, DEFAULT_PORT};
