use std::collections::BTreeMap;
use std::fmt;

/// Reserved map key that marks a serialized value as an error.
///
/// A failure crosses the wire as a single-key map `{"!error": {"kind": ...,
/// "message": ...}}`. The key is rejected in user-supplied maps at encode
/// time, so the tag is unambiguous by construction.
pub const ERROR_TAG: &str = "!error";

/// Error kind reported when a request names an operation the handler does
/// not expose.
pub const KIND_OPERATION_NOT_FOUND: &str = "operation_not_found";

/// Default error kind for operations that started and then failed.
pub const KIND_OPERATION_FAILED: &str = "operation_failed";

/// A self-contained datum that can cross the wire.
///
/// Values are transient: built for one call, serialized, transmitted, and
/// discarded. The closed set of variants is the whole vocabulary of the
/// protocol; there is no extension point for arbitrary native objects.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A failure travelling as data. See [`ERROR_TAG`].
    Error(ErrorValue),
}

impl Value {
    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Error(_) => "error",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorValue> {
        match self {
            Value::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<ErrorValue> for Value {
    fn from(err: ErrorValue) -> Self {
        Value::Error(err)
    }
}

/// A remote failure carried as data: a machine-readable kind plus a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorValue {
    pub kind: String,
    pub message: String,
}

impl ErrorValue {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The error returned when a command resolves to nothing.
    pub fn operation_not_found(command: &str) -> Self {
        Self::new(
            KIND_OPERATION_NOT_FOUND,
            format!("no such operation: {command}"),
        )
    }

    /// An operation that was found and invoked, but failed.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::new(KIND_OPERATION_FAILED, message)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variants() {
        assert_eq!(Value::from(7).as_int(), Some(7));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(1.5).as_float(), Some(1.5));
        assert!(Value::Null.is_null());
        assert!(Value::from("hi").as_int().is_none());
    }

    #[test]
    fn error_value_display() {
        let err = ErrorValue::operation_not_found("parrot");
        assert_eq!(err.kind, KIND_OPERATION_NOT_FOUND);
        assert_eq!(err.to_string(), "operation_not_found: no such operation: parrot");
    }

    #[test]
    fn operation_failed_defaults_kind() {
        let err = ErrorValue::operation_failed("Foo!");
        assert_eq!(err.kind, KIND_OPERATION_FAILED);
        assert_eq!(err.message, "Foo!");
    }

    #[test]
    fn value_from_collections() {
        let list = Value::from(vec![Value::from(1), Value::from(2)]);
        assert_eq!(list.as_list().map(<[Value]>::len), Some(2));

        let mut entries = BTreeMap::new();
        entries.insert("k".to_owned(), Value::from("v"));
        let map = Value::from(entries);
        assert_eq!(
            map.as_map().and_then(|m| m.get("k")).and_then(Value::as_str),
            Some("v")
        );
    }
}
