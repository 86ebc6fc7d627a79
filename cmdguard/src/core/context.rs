//! Argument overlay context handed to guards and handlers.
//!
//! Wraps the immutable [`ParsedArguments`] of one invocation and layers a
//! mutable override map on top. An override always wins over the source,
//! whatever order the two were populated in.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::value::{ArgValue, ParsedArguments};
use crate::error::ArgumentError;

/// Overlay state for one argument name. A name with no entry is not overridden.
#[derive(Debug, Clone)]
enum Override {
    Value(ArgValue),
    Absent,
    Removed,
}

#[derive(Debug, Clone)]
pub struct ArgumentContext {
    source: Arc<ParsedArguments>,
    overlay: HashMap<String, Override>,
    command: Arc<str>,
    depth: u32,
}

impl ArgumentContext {
    pub fn new(source: Arc<ParsedArguments>) -> Self {
        Self::for_command(source, Arc::from(""))
    }

    /// Context for an invocation of the command at `command` (space-separated node names).
    pub fn for_command(source: Arc<ParsedArguments>, command: Arc<str>) -> Self {
        Self {
            source,
            overlay: HashMap::new(),
            command,
            depth: 0,
        }
    }

    /// Context for a command executed from within another invocation.
    ///
    /// The nested context reads `source` and inherits this context's overrides
    /// for every name `source` does not supply itself. Nothing it does is
    /// visible to `self`.
    pub(crate) fn nested(&self, source: Arc<ParsedArguments>, command: Arc<str>) -> Self {
        let overlay = self
            .overlay
            .iter()
            .filter(|(name, _)| !source.contains(name))
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect();
        Self {
            source,
            overlay,
            command,
            depth: self.depth + 1,
        }
    }

    /// Independent copy sharing the same source. Equivalent to `clone()`.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    pub fn source(&self) -> &ParsedArguments {
        &self.source
    }

    /// Space-separated node names of the executed command, root excluded.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Number of enclosing invocations this context was nested under.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    fn resolve(&self, name: &str) -> Result<Option<&ArgValue>, ArgumentError> {
        match self.overlay.get(name) {
            Some(Override::Value(value)) => Ok(Some(value)),
            Some(Override::Absent) => Ok(None),
            Some(Override::Removed) => Err(ArgumentError::Removed {
                name: name.to_string(),
            }),
            None => self
                .source
                .get(name)
                .map(Some)
                .ok_or_else(|| ArgumentError::NotFound {
                    name: name.to_string(),
                }),
        }
    }

    /// Borrow an argument, yielding `None` if a guard set it to no value.
    pub fn get_optional_ref<T: Any>(&self, name: &str) -> Result<Option<&T>, ArgumentError> {
        let Some(value) = self.resolve(name)? else {
            return Ok(None);
        };
        value
            .downcast_ref::<T>()
            .map(Some)
            .ok_or_else(|| ArgumentError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
                actual: value.arg_type().name(),
            })
    }

    pub fn get_ref<T: Any>(&self, name: &str) -> Result<&T, ArgumentError> {
        self.get_optional_ref::<T>(name)?
            .ok_or_else(|| ArgumentError::Absent {
                name: name.to_string(),
            })
    }

    pub fn get_optional<T: Any + Clone>(&self, name: &str) -> Result<Option<T>, ArgumentError> {
        Ok(self.get_optional_ref::<T>(name)?.cloned())
    }

    pub fn get<T: Any + Clone>(&self, name: &str) -> Result<T, ArgumentError> {
        self.get_ref::<T>(name).cloned()
    }

    pub fn set<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.set_value(name, ArgValue::new(value));
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: ArgValue) {
        self.overlay.insert(name.into(), Override::Value(value));
    }

    /// Override `name` with "no value". Unlike [`remove`](Self::remove), reads
    /// through [`get_optional`](Self::get_optional) succeed with `None`.
    pub fn set_absent(&mut self, name: impl Into<String>) {
        self.overlay.insert(name.into(), Override::Absent);
    }

    pub fn remove(&mut self, name: impl Into<String>) {
        self.overlay.insert(name.into(), Override::Removed);
    }

    /// Drop any override for `name`, reverting reads to the parsed source.
    pub fn reset(&mut self, name: &str) {
        self.overlay.remove(name);
    }

    /// True when `name` resolves to a value or an explicit absence.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    pub fn is_overridden(&self, name: &str) -> bool {
        self.overlay.contains_key(name)
    }

    /// Names that currently carry an override, sorted.
    pub fn overrides(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.overlay.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
