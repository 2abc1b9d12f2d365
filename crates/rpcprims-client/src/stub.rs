use std::fmt;

use rpcprims_wire::{Kwargs, OperationDescriptor, Value};

use crate::client::{call_with_config, ClientConfig};
use crate::error::Result;

/// Local proxy for one remote operation.
///
/// Carries everything needed to perform its own round trip, so a stub keeps
/// working if it outlives the client that generated it.
#[derive(Clone)]
pub struct Stub {
    descriptor: OperationDescriptor,
    config: ClientConfig,
}

impl Stub {
    pub(crate) fn new(descriptor: OperationDescriptor, config: ClientConfig) -> Self {
        Self { descriptor, config }
    }

    /// The remote operation's name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// The documentation string discovered from the server.
    pub fn doc(&self) -> &str {
        &self.descriptor.doc
    }

    /// Forward a call to the remote operation.
    ///
    /// Equivalent to [`crate::RpcClient::call`] with this stub's name.
    pub fn invoke(&self, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        call_with_config(&self.config, self.name(), args, kwargs)
    }
}

impl fmt::Debug for Stub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stub")
            .field("name", &self.descriptor.name)
            .field("server", &self.config.server)
            .field("port", &self.config.port)
            .finish()
    }
}
