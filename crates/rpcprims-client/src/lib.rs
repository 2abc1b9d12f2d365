//! rpcprims client: discovery, generated stubs, and the generic call path.
//!
//! [`RpcClient::connect`] asks the server for its operation catalog and
//! materializes one [`Stub`] per discovered operation, exactly once. Every
//! call, the discovery included, is one TCP connection: connect, send one
//! request, read one value, close. A remote failure comes back as
//! [`ClientError::Remote`] carrying the server's kind and message.

pub mod client;
pub mod error;
pub mod stub;

pub use client::{ClientConfig, RpcClient};
pub use error::{ClientError, Result};
pub use stub::Stub;
