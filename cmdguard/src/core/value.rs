//! Type-erased argument values and the parser-provided argument source.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::BuildError;

/// Runtime descriptor of the type an argument is declared or stored with.
///
/// Equality compares the underlying [`TypeId`]; the name is for messages only.
#[derive(Clone, Copy)]
pub struct ArgType {
    id: TypeId,
    name: &'static str,
}

impl ArgType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ArgType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ArgType {}

impl Hash for ArgType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArgType({})", self.name)
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A cheaply clonable, type-erased argument value.
#[derive(Clone)]
pub struct ArgValue {
    value: Arc<dyn Any + Send + Sync>,
    ty: ArgType,
}

impl ArgValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            ty: ArgType::of::<T>(),
        }
    }

    pub fn arg_type(&self) -> ArgType {
        self.ty
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.value).downcast_ref::<T>()
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArgValue({})", self.ty.name)
    }
}

/// Read-only name -> value map produced by the parser for one invocation.
///
/// Names are unique; a second insert under the same name is rejected.
#[derive(Debug, Clone, Default)]
pub struct ParsedArguments {
    values: HashMap<String, ArgValue>,
}

impl ParsedArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> Result<(), BuildError> {
        self.insert_value(name, ArgValue::new(value))
    }

    pub fn insert_value(
        &mut self,
        name: impl Into<String>,
        value: ArgValue,
    ) -> Result<(), BuildError> {
        match self.values.entry(name.into()) {
            Entry::Occupied(entry) => Err(BuildError::DuplicateArgument {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<T: Any + Send + Sync>(
        mut self,
        name: impl Into<String>,
        value: T,
    ) -> Result<Self, BuildError> {
        self.insert(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument names in lexicographic order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
