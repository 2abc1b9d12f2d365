use std::collections::BTreeMap;
use std::fmt;

use serde_json::json;

use crate::error::{Result, WireError};
use crate::request::{Kwargs, Request};
use crate::value::{ErrorValue, Value, ERROR_TAG};

/// Serialization protocol for payloads.
///
/// Selected out of band; both ends must be configured with the same protocol.
/// There is no in-band negotiation, so a mismatch surfaces as a decode error
/// on whichever side reads first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// Protocol 1: JSON text.
    #[default]
    Json,
    /// Protocol 2: self-describing MessagePack.
    Msgpack,
}

impl Protocol {
    /// The numeric protocol option, as surfaced in configuration.
    pub fn number(self) -> u8 {
        match self {
            Protocol::Json => 1,
            Protocol::Msgpack => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Protocol::Json),
            2 => Some(Protocol::Msgpack),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Protocol::Json => "json",
            Protocol::Msgpack => "msgpack",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serialize a value under the selected protocol.
pub fn encode_value(value: &Value, protocol: Protocol) -> Result<Vec<u8>> {
    let tree = to_interchange(value, protocol)?;
    serialize_tree(&tree, protocol)
}

/// Deserialize a value under the selected protocol.
pub fn decode_value(bytes: &[u8], protocol: Protocol) -> Result<Value> {
    let tree = deserialize_tree(bytes, protocol)?;
    from_interchange(tree, protocol)
}

/// Serialize a request envelope: `{"command": ..., "args": [...],
/// "kwargs": {...}}`.
pub fn encode_request(request: &Request, protocol: Protocol) -> Result<Vec<u8>> {
    let args = request
        .args
        .iter()
        .map(|value| to_interchange(value, protocol))
        .collect::<Result<Vec<_>>>()?;
    let kwargs = request
        .kwargs
        .iter()
        .map(|(name, value)| Ok((name.clone(), to_interchange(value, protocol)?)))
        .collect::<Result<serde_json::Map<String, serde_json::Value>>>()?;
    let tree = json!({
        "command": request.command,
        "args": args,
        "kwargs": kwargs,
    });
    serialize_tree(&tree, protocol)
}

/// Deserialize a request envelope.
///
/// `command` must be present and non-empty. Missing `args`/`kwargs` default
/// to empty; unknown envelope keys are ignored.
pub fn decode_request(bytes: &[u8], protocol: Protocol) -> Result<Request> {
    let tree = deserialize_tree(bytes, protocol)?;
    let serde_json::Value::Object(mut envelope) = tree else {
        return Err(decode_error(protocol, "request envelope is not a map"));
    };

    let command = match envelope.remove("command") {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::String(_)) => {
            return Err(decode_error(protocol, "request command is empty"))
        }
        Some(other) => {
            return Err(decode_error(
                protocol,
                format!("request command is not a string: {other}"),
            ))
        }
        None => return Err(decode_error(protocol, "request envelope missing command")),
    };

    let args = match envelope.remove("args") {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| from_interchange(item, protocol))
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(decode_error(
                protocol,
                format!("request args is not a list: {other}"),
            ))
        }
        None => Vec::new(),
    };

    let kwargs = match envelope.remove("kwargs") {
        Some(serde_json::Value::Object(entries)) => entries
            .into_iter()
            .map(|(name, value)| Ok((name, from_interchange(value, protocol)?)))
            .collect::<Result<Kwargs>>()?,
        Some(other) => {
            return Err(decode_error(
                protocol,
                format!("request kwargs is not a map: {other}"),
            ))
        }
        None => Kwargs::new(),
    };

    Ok(Request {
        command,
        args,
        kwargs,
    })
}

fn serialize_tree(tree: &serde_json::Value, protocol: Protocol) -> Result<Vec<u8>> {
    match protocol {
        Protocol::Json => serde_json::to_vec(tree).map_err(|err| WireError::Encode {
            protocol,
            detail: err.to_string(),
        }),
        Protocol::Msgpack => rmp_serde::to_vec_named(tree).map_err(|err| WireError::Encode {
            protocol,
            detail: err.to_string(),
        }),
    }
}

fn deserialize_tree(bytes: &[u8], protocol: Protocol) -> Result<serde_json::Value> {
    match protocol {
        Protocol::Json => serde_json::from_slice(bytes).map_err(|err| WireError::Decode {
            protocol,
            detail: err.to_string(),
        }),
        Protocol::Msgpack => rmp_serde::from_slice(bytes).map_err(|err| WireError::Decode {
            protocol,
            detail: err.to_string(),
        }),
    }
}

fn decode_error(protocol: Protocol, detail: impl Into<String>) -> WireError {
    WireError::Decode {
        protocol,
        detail: detail.into(),
    }
}

/// Lower a value to the interchange tree shared by both protocols.
///
/// Error values become the tagged single-key map; user maps carrying the tag
/// are rejected so the tag stays unambiguous. Non-finite floats are rejected
/// under both protocols to keep them interchangeable.
fn to_interchange(value: &Value, protocol: Protocol) -> Result<serde_json::Value> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(WireError::Encode {
                    protocol,
                    detail: format!("non-finite float {f} cannot cross the wire"),
                });
            }
            serde_json::Value::from(*f)
        }
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(
            items
                .iter()
                .map(|item| to_interchange(item, protocol))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Map(entries) => {
            if entries.contains_key(ERROR_TAG) {
                return Err(WireError::ReservedTag);
            }
            serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(name, value)| Ok((name.clone(), to_interchange(value, protocol)?)))
                    .collect::<Result<serde_json::Map<_, _>>>()?,
            )
        }
        Value::Error(err) => json!({
            ERROR_TAG: { "kind": err.kind, "message": err.message }
        }),
    })
}

/// Raise an interchange tree back into a value, recognizing the error tag at
/// any depth.
fn from_interchange(tree: serde_json::Value, protocol: Protocol) -> Result<Value> {
    Ok(match tree {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if n.is_u64() {
                return Err(decode_error(
                    protocol,
                    format!("integer {n} does not fit a signed 64-bit value"),
                ));
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                return Err(decode_error(protocol, format!("unrepresentable number {n}")));
            }
        }
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(items) => Value::List(
            items
                .into_iter()
                .map(|item| from_interchange(item, protocol))
                .collect::<Result<Vec<_>>>()?,
        ),
        serde_json::Value::Object(entries) => {
            if entries.contains_key(ERROR_TAG) {
                return error_from_tagged(entries, protocol);
            }
            Value::Map(
                entries
                    .into_iter()
                    .map(|(name, value)| Ok((name, from_interchange(value, protocol)?)))
                    .collect::<Result<BTreeMap<_, _>>>()?,
            )
        }
    })
}

fn error_from_tagged(
    mut entries: serde_json::Map<String, serde_json::Value>,
    protocol: Protocol,
) -> Result<Value> {
    if entries.len() != 1 {
        return Err(decode_error(
            protocol,
            "error tag must be the only key in its map",
        ));
    }
    let Some(serde_json::Value::Object(body)) = entries.remove(ERROR_TAG) else {
        return Err(decode_error(protocol, "error tag body is not a map"));
    };
    let kind = match body.get("kind") {
        Some(serde_json::Value::String(s)) => s.clone(),
        _ => return Err(decode_error(protocol, "error tag body missing string kind")),
    };
    let message = match body.get("message") {
        Some(serde_json::Value::String(s)) => s.clone(),
        _ => {
            return Err(decode_error(
                protocol,
                "error tag body missing string message",
            ))
        }
    };
    Ok(Value::Error(ErrorValue::new(kind, message)))
}
