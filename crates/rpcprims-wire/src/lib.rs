//! Wire format for rpcprims: tagged values, request envelopes, and
//! length-prefixed framing.
//!
//! Every payload travels as one frame:
//! - A 2-byte magic number ("RP") for stream synchronization
//! - A 4-byte little-endian payload length
//!
//! The payload is a [`Value`] or [`Request`] serialized under a [`Protocol`]
//! (JSON or MessagePack) chosen out of band and configured identically on
//! both ends. Failures cross the wire as ordinary values under a reserved
//! error tag, so a response is always exactly one value.

pub mod codec;
pub mod error;
pub mod frame;
pub mod ops;
pub mod reader;
pub mod request;
pub mod value;
pub mod writer;

pub use codec::{decode_request, decode_value, encode_request, encode_value, Protocol};
pub use error::{Result, WireError};
pub use frame::{decode_frame, encode_frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE, MAGIC};
pub use ops::{catalog_from_value, catalog_to_value, OperationDescriptor, DISCOVERY_COMMAND};
pub use reader::FrameReader;
pub use request::{Kwargs, Request};
pub use value::{ErrorValue, Value, ERROR_TAG, KIND_OPERATION_FAILED, KIND_OPERATION_NOT_FOUND};
pub use writer::FrameWriter;
