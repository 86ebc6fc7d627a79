//! Typed, reusable references to tree-scoped arguments.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::core::context::ArgumentContext;
use crate::core::value::ArgType;
use crate::error::ArgumentError;
use crate::tree::NodeId;

/// A `{name, type}` pair bound once and read from any context.
///
/// Holds no reference to a context; it is only a lookup key. References made
/// through [`CommandTreeBuilder::argument_ref`](crate::CommandTreeBuilder::argument_ref)
/// are checked against the declared argument type while the tree is built.
pub struct ArgumentRef<T> {
    name: Arc<str>,
    scope: Option<NodeId>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> ArgumentRef<T> {
    /// Unchecked binding with no tree scope.
    pub fn bind(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            scope: None,
            _marker: PhantomData,
        }
    }

    pub(crate) fn scoped(name: impl Into<Arc<str>>, scope: NodeId) -> Self {
        Self {
            name: name.into(),
            scope: Some(scope),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument node that declares this argument, if the binding was checked.
    pub fn scope(&self) -> Option<NodeId> {
        self.scope
    }

    pub fn arg_type(&self) -> ArgType {
        ArgType::of::<T>()
    }

    pub fn read_ref<'c>(&self, ctx: &'c ArgumentContext) -> Result<&'c T, ArgumentError> {
        ctx.get_ref::<T>(&self.name)
    }

    pub fn remove(&self, ctx: &mut ArgumentContext) {
        ctx.remove(&*self.name);
    }

    pub fn reset(&self, ctx: &mut ArgumentContext) {
        ctx.reset(&self.name);
    }
}

impl<T: Any + Clone> ArgumentRef<T> {
    pub fn read(&self, ctx: &ArgumentContext) -> Result<T, ArgumentError> {
        ctx.get::<T>(&self.name)
    }

    pub fn read_optional(&self, ctx: &ArgumentContext) -> Result<Option<T>, ArgumentError> {
        ctx.get_optional::<T>(&self.name)
    }
}

impl<T: Any + Send + Sync> ArgumentRef<T> {
    pub fn write(&self, ctx: &mut ArgumentContext, value: T) {
        ctx.set(&*self.name, value);
    }
}

impl<T> Clone for ArgumentRef<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            scope: self.scope,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ArgumentRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentRef")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .field("scope", &self.scope)
            .finish()
    }
}
