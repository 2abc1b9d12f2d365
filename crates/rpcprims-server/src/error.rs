use rpcprims_wire::{ErrorValue, KIND_OPERATION_FAILED};

/// Errors that can occur while configuring or running a server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding the listener failed. Fatal: the serve loop never starts.
    #[error("transport error: {0}")]
    Transport(#[from] rpcprims_transport::TransportError),

    /// Attempted to register the reserved discovery command.
    #[error("operation name {0:?} is reserved")]
    ReservedName(String),

    /// Attempted to register a name twice.
    #[error("operation name {0:?} is already registered")]
    DuplicateName(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// The failure side of [`crate::Handler::invoke`].
///
/// Both variants are converted to error values and sent to the caller; they
/// never terminate the serve loop.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// The command resolved to nothing.
    #[error("no such operation: {command}")]
    NotFound { command: String },

    /// The operation was found and invoked, but failed.
    #[error("{kind}: {message}")]
    Failed { kind: String, message: String },
}

impl InvokeError {
    /// Render the failure as the value that crosses the wire.
    pub fn to_error_value(&self) -> ErrorValue {
        match self {
            InvokeError::NotFound { command } => ErrorValue::operation_not_found(command),
            InvokeError::Failed { kind, message } => ErrorValue::new(kind, message),
        }
    }
}

impl From<OperationError> for InvokeError {
    fn from(err: OperationError) -> Self {
        InvokeError::Failed {
            kind: err.kind,
            message: err.message,
        }
    }
}

/// A failure raised by an operation body.
///
/// `kind` defaults to `operation_failed`; operations may substitute their
/// own, which is carried to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct OperationError {
    pub kind: String,
    pub message: String,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: KIND_OPERATION_FAILED.to_owned(),
            message: message.into(),
        }
    }

    pub fn with_kind(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}
