//! Guards: single units of middleware logic.

use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::codes;
use crate::core::context::ArgumentContext;
use crate::error::CommandError;

/// Outcome of evaluating one guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardResult {
    Continue,
    /// Stop the chain and the handler; the code is returned to the caller verbatim.
    Abort(i32),
}

impl GuardResult {
    /// Abort carrying [`codes::NO_SUCCESS`].
    pub fn abort() -> Self {
        Self::Abort(codes::NO_SUCCESS)
    }

    pub fn is_continue(self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// Middleware evaluated after parsing and before a handler.
///
/// Guards may read and rewrite the context they are given. An `Err` is a hard
/// failure of the invocation, never an implicit continue.
pub trait Guard: Send + Sync {
    fn check(&self, ctx: &mut ArgumentContext) -> Result<GuardResult, CommandError>;
}

impl<F> Guard for F
where
    F: Fn(&mut ArgumentContext) -> Result<GuardResult, CommandError> + Send + Sync,
{
    fn check(&self, ctx: &mut ArgumentContext) -> Result<GuardResult, CommandError> {
        self(ctx)
    }
}

struct Noop;

impl Guard for Noop {
    fn check(&self, _ctx: &mut ArgumentContext) -> Result<GuardResult, CommandError> {
        Ok(GuardResult::Continue)
    }
}

static NOOP: LazyLock<Arc<dyn Guard>> = LazyLock::new(|| Arc::new(Noop));

/// Shared handle to a guard.
///
/// Every handle from [`GuardHandle::noop`] points at one static instance and is
/// recognised by identity; a user guard that happens to do nothing is still a
/// user guard.
#[derive(Clone)]
pub struct GuardHandle(Arc<dyn Guard>);

impl GuardHandle {
    pub fn noop() -> Self {
        Self(Arc::clone(&NOOP))
    }

    pub fn new<G: Guard + 'static>(guard: G) -> Self {
        Self(Arc::new(guard))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut ArgumentContext) -> Result<GuardResult, CommandError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn is_noop(&self) -> bool {
        Arc::ptr_eq(&self.0, &NOOP)
    }

    pub fn check(&self, ctx: &mut ArgumentContext) -> Result<GuardResult, CommandError> {
        self.0.check(ctx)
    }
}

impl Default for GuardHandle {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for GuardHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            f.write_str("GuardHandle(noop)")
        } else {
            f.write_str("GuardHandle(custom)")
        }
    }
}

/// Run `guards` in order on one chain link; the first abort wins.
pub fn all_of(guards: impl IntoIterator<Item = GuardHandle>) -> GuardHandle {
    let guards: Vec<GuardHandle> = guards.into_iter().collect();
    GuardHandle::from_fn(move |ctx| {
        for guard in &guards {
            let result = guard.check(ctx)?;
            if !result.is_continue() {
                return Ok(result);
            }
        }
        Ok(GuardResult::Continue)
    })
}

/// Abort with `code` unless `predicate` holds.
pub fn require<P>(predicate: P, code: i32) -> GuardHandle
where
    P: Fn(&ArgumentContext) -> Result<bool, CommandError> + Send + Sync + 'static,
{
    GuardHandle::from_fn(move |ctx| {
        if predicate(ctx)? {
            Ok(GuardResult::Continue)
        } else {
            Ok(GuardResult::Abort(code))
        }
    })
}
