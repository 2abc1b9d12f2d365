//! Minimal remote procedure calls over TCP.
//!
//! rpcprims exposes a set of named operations from a server-side registry;
//! a client discovers them at connect time and materializes local stubs that
//! forward calls across the network and re-surface remote failures.
//!
//! # Crate Structure
//!
//! - [`wire`] — Tagged values, request envelopes, and length-prefixed framing
//! - [`transport`] — TCP bind/accept with bounded waits, per-call connections
//! - [`server`] — Operation registry, dispatch, and the serve loop (behind `server` feature)
//! - [`client`] — Discovery, generated stubs, and the generic call path (behind `client` feature)

/// Re-export wire types.
pub mod wire {
    pub use rpcprims_wire::*;
}

/// Re-export transport types.
pub mod transport {
    pub use rpcprims_transport::*;
}

/// Re-export server types (requires `server` feature).
#[cfg(feature = "server")]
pub mod server {
    pub use rpcprims_server::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use rpcprims_client::*;
}
