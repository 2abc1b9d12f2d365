use std::collections::BTreeMap;
use std::fmt::Write as _;

use rpcprims_wire::{Kwargs, OperationDescriptor, Value, DISCOVERY_COMMAND};
use tracing::debug;

use crate::error::{InvokeError, OperationError, Result, ServerError};
use crate::handler::Handler;

/// An operation body: positional and keyword arguments in, value out.
pub type OperationFn =
    Box<dyn FnMut(&[Value], &Kwargs) -> std::result::Result<Value, OperationError> + Send>;

enum Entry {
    Operation { doc: String, body: OperationFn },
    Attribute { value: Value },
}

/// Explicit name-to-entry map; the batteries-included [`Handler`].
///
/// Operations are catalog-listed and invoked with their arguments.
/// Attributes answer with their stored value directly, arguments ignored,
/// and never appear in the catalog. Names beginning with `_` are registrable
/// and resolvable but stay out of the catalog as well.
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callable operation under `name` with its documentation
    /// string.
    pub fn register_operation<F>(&mut self, name: &str, doc: &str, body: F) -> Result<()>
    where
        F: FnMut(&[Value], &Kwargs) -> std::result::Result<Value, OperationError> + Send + 'static,
    {
        self.insert(
            name,
            Entry::Operation {
                doc: doc.to_owned(),
                body: Box::new(body),
            },
        )
    }

    /// Register a readable attribute under `name`.
    pub fn register_attribute(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.insert(
            name,
            Entry::Attribute {
                value: value.into(),
            },
        )
    }

    fn insert(&mut self, name: &str, entry: Entry) -> Result<()> {
        if name == DISCOVERY_COMMAND {
            return Err(ServerError::ReservedName(name.to_owned()));
        }
        if self.entries.contains_key(name) {
            return Err(ServerError::DuplicateName(name.to_owned()));
        }
        self.entries.insert(name.to_owned(), entry);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One-screen summary: public attributes, then the operation catalog.
    pub fn describe(&self) -> String {
        let mut out = String::from("Registry Details\n");
        for (name, entry) in &self.entries {
            if let Entry::Attribute { value } = entry {
                if !name.starts_with('_') {
                    let _ = writeln!(out, "  {name:<10}: {value:?}");
                }
            }
        }
        out.push_str("External Operations\n");
        for descriptor in self.operations() {
            let first_line = descriptor.doc.lines().next().unwrap_or("");
            let _ = writeln!(out, "  {}: {}", descriptor.name, first_line);
        }
        out
    }
}

impl Handler for Registry {
    fn operations(&self) -> Vec<OperationDescriptor> {
        self.entries
            .iter()
            .filter_map(|(name, entry)| match entry {
                Entry::Operation { doc, .. } if !name.starts_with('_') => {
                    Some(OperationDescriptor::new(name.clone(), doc.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn invoke(
        &mut self,
        command: &str,
        args: &[Value],
        kwargs: &Kwargs,
    ) -> std::result::Result<Value, InvokeError> {
        match self.entries.get_mut(command) {
            None => {
                debug!(command, "not found");
                Err(InvokeError::NotFound {
                    command: command.to_owned(),
                })
            }
            Some(Entry::Attribute { value }) => {
                debug!(command, "attribute read");
                Ok(value.clone())
            }
            Some(Entry::Operation { body, .. }) => {
                debug!(command, "invoking operation");
                body(args, kwargs).map_err(Into::into)
            }
        }
    }
}
