use crate::codec::Protocol;

/// Errors that can occur while encoding, decoding, or framing payloads.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x5250 \"RP\")")]
    InvalidMagic,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// The value could not be serialized under the selected protocol.
    #[error("encode error ({protocol}): {detail}")]
    Encode { protocol: Protocol, detail: String },

    /// The payload bytes are not a valid value under the selected protocol.
    #[error("decode error ({protocol}): {detail}")]
    Decode { protocol: Protocol, detail: String },

    /// A user-supplied map used the reserved error tag key.
    #[error("maps may not use the reserved error tag key \"!error\"")]
    ReservedTag,

    /// A discovery response did not have the expected catalog shape.
    #[error("malformed operation catalog: {detail}")]
    Catalog { detail: String },
}

pub type Result<T> = std::result::Result<T, WireError>;
