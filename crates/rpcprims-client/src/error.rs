use rpcprims_wire::ErrorValue;

/// Errors that can occur on the client side of a call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connecting or talking to the server failed.
    #[error("transport error: {0}")]
    Transport(#[from] rpcprims_transport::TransportError),

    /// Encoding the request or decoding the response failed.
    #[error("wire error: {0}")]
    Wire(#[from] rpcprims_wire::WireError),

    /// The remote operation failed; kind and message as the server reported
    /// them.
    #[error("remote error: {0}")]
    Remote(ErrorValue),
}

impl ClientError {
    /// The remote failure, when this is one.
    pub fn as_remote(&self) -> Option<&ErrorValue> {
        match self {
            ClientError::Remote(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
