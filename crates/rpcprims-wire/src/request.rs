use std::collections::BTreeMap;

use crate::value::Value;

/// Keyword arguments: name to value, name-ordered.
pub type Kwargs = BTreeMap<String, Value>;

/// One remote invocation: the command name plus positional and keyword
/// arguments.
///
/// `command` is never empty; decoding rejects envelopes without one. Both
/// argument collections may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub command: String,
    pub args: Vec<Value>,
    pub kwargs: Kwargs,
}

impl Request {
    /// A request with no arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            kwargs: Kwargs::new(),
        }
    }

    /// Replace the positional arguments.
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Replace the keyword arguments.
    pub fn with_kwargs(mut self, kwargs: Kwargs) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Append one positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set one keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }
}
