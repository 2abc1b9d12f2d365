use rpcprims_wire::{Kwargs, OperationDescriptor, Value};

use crate::error::InvokeError;

/// Server-side capability contract.
///
/// A handler names the operations it exposes and executes commands against
/// them. The dispatch loop is single-threaded and calls `invoke` with
/// exclusive access, so implementations need no internal synchronization.
pub trait Handler {
    /// The externally visible catalog, name-sorted.
    ///
    /// Computed fresh on every call; the dispatch loop never caches it, so
    /// operations added between discoveries show up in the next one.
    fn operations(&self) -> Vec<OperationDescriptor>;

    /// Execute `command` with the given arguments.
    ///
    /// Resolution is wider than the catalog: underscore-prefixed names and
    /// attributes are reachable even though they are never listed.
    fn invoke(
        &mut self,
        command: &str,
        args: &[Value],
        kwargs: &Kwargs,
    ) -> std::result::Result<Value, InvokeError>;
}
