//! rpcprims server: operation registry, dispatch, and the serve loop.
//!
//! A [`Handler`] names its operations and executes commands; [`Registry`] is
//! the batteries-included implementation backed by explicit registration.
//! [`RpcServer`] owns the accept loop: one connection at a time, one request
//! per connection, failures converted to data and sent back to the caller.

pub mod error;
pub mod handler;
pub mod registry;
pub mod server;

pub use error::{InvokeError, OperationError, Result, ServerError};
pub use handler::Handler;
pub use registry::Registry;
pub use server::{RpcServer, ServerConfig, ServerHandle, DEFAULT_ACCEPT_TIMEOUT};
