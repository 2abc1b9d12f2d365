use std::collections::BTreeMap;

use crate::error::{Result, WireError};
use crate::value::Value;

/// Reserved command that returns the server's operation catalog.
///
/// The leading underscore keeps it outside the catalog namespace: handlers
/// may not register it, and underscore-prefixed names are never listed.
pub const DISCOVERY_COMMAND: &str = "_operations";

/// One catalog entry: an operation name and its documentation string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: String,
    pub doc: String,
}

impl OperationDescriptor {
    pub fn new(name: impl Into<String>, doc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: doc.into(),
        }
    }

    /// Wire shape: `{"name": ..., "doc": ...}`.
    pub fn to_value(&self) -> Value {
        let mut entries = BTreeMap::new();
        entries.insert("name".to_owned(), Value::Str(self.name.clone()));
        entries.insert("doc".to_owned(), Value::Str(self.doc.clone()));
        Value::Map(entries)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = value.as_map().ok_or_else(|| WireError::Catalog {
            detail: format!("descriptor is {}, expected map", value.type_name()),
        })?;
        let name = entries
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| WireError::Catalog {
                detail: "descriptor missing string field \"name\"".to_owned(),
            })?;
        let doc = entries
            .get("doc")
            .and_then(Value::as_str)
            .ok_or_else(|| WireError::Catalog {
                detail: "descriptor missing string field \"doc\"".to_owned(),
            })?;
        Ok(Self::new(name, doc))
    }
}

/// Render a catalog as its wire value: a list of descriptor maps.
pub fn catalog_to_value(ops: &[OperationDescriptor]) -> Value {
    Value::List(ops.iter().map(OperationDescriptor::to_value).collect())
}

/// Parse a discovery response back into descriptors.
pub fn catalog_from_value(value: &Value) -> Result<Vec<OperationDescriptor>> {
    let items = value.as_list().ok_or_else(|| WireError::Catalog {
        detail: format!("catalog is {}, expected list", value.type_name()),
    })?;
    items.iter().map(OperationDescriptor::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_roundtrip() {
        let ops = vec![
            OperationDescriptor::new("echo", "Echo a message back."),
            OperationDescriptor::new("ping", "Answer PONG."),
        ];
        let value = catalog_to_value(&ops);
        let parsed = catalog_from_value(&value).unwrap();
        assert_eq!(parsed, ops);
    }

    #[test]
    fn catalog_rejects_non_list() {
        let err = catalog_from_value(&Value::from("nope")).unwrap_err();
        assert!(matches!(err, WireError::Catalog { .. }));
    }

    #[test]
    fn descriptor_rejects_missing_fields() {
        let mut entries = BTreeMap::new();
        entries.insert("name".to_owned(), Value::from("echo"));
        let err = OperationDescriptor::from_value(&Value::Map(entries)).unwrap_err();
        assert!(matches!(err, WireError::Catalog { .. }));
    }

    #[test]
    fn discovery_command_is_underscore_prefixed() {
        assert!(DISCOVERY_COMMAND.starts_with('_'));
    }
}
