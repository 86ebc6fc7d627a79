//! Tree-shaped guard chain.
//!
//! Links live in an arena and point at their parent, mirroring the command
//! tree they were built alongside. Extending a link never copies the chain
//! above it, and a link can only refer to links created before it, so the
//! structure cannot form a cycle.

use tracing::{debug, trace};

use crate::core::context::ArgumentContext;
use crate::core::guard::{GuardHandle, GuardResult};
use crate::error::{BuildError, CommandError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(usize);

impl LinkId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct ChainLink {
    parent: Option<LinkId>,
    guard: GuardHandle,
    /// Whether `guard` fires when this link is itself the execution target.
    run_on_same_node: bool,
    assigned: bool,
}

impl ChainLink {
    fn new(parent: Option<LinkId>) -> Self {
        Self {
            parent,
            guard: GuardHandle::noop(),
            run_on_same_node: true,
            assigned: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuardChain {
    links: Vec<ChainLink>,
}

impl Default for GuardChain {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardChain {
    /// Chain holding only the root link.
    pub fn new() -> Self {
        Self {
            links: vec![ChainLink::new(None)],
        }
    }

    pub fn root(&self) -> LinkId {
        LinkId(0)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn link(&self, id: LinkId) -> Option<&ChainLink> {
        self.links.get(id.0)
    }

    /// Create a child of `parent` holding the no-op guard.
    pub fn extend(&mut self, parent: LinkId) -> Result<LinkId, BuildError> {
        if self.link(parent).is_none() {
            return Err(BuildError::UnknownLink { link: parent.0 });
        }
        let id = LinkId(self.links.len());
        self.links.push(ChainLink::new(Some(parent)));
        Ok(id)
    }

    /// Install `guard` on `link`. Each link accepts exactly one assignment.
    pub fn assign(
        &mut self,
        link: LinkId,
        guard: GuardHandle,
        run_on_same_node: bool,
    ) -> Result<(), BuildError> {
        let entry = self
            .links
            .get_mut(link.0)
            .ok_or(BuildError::UnknownLink { link: link.0 })?;
        if entry.assigned {
            return Err(BuildError::GuardAlreadyAssigned { link: link.0 });
        }
        entry.guard = guard;
        entry.run_on_same_node = run_on_same_node;
        entry.assigned = true;
        Ok(())
    }

    pub fn parent(&self, link: LinkId) -> Option<LinkId> {
        self.link(link).and_then(|entry| entry.parent)
    }

    pub fn runs_on_same_node(&self, link: LinkId) -> bool {
        self.link(link).is_some_and(|entry| entry.run_on_same_node)
    }

    /// Link ids from the root down to `terminal`. Empty for an unknown link.
    pub fn path(&self, terminal: LinkId) -> Vec<LinkId> {
        let mut path = Vec::new();
        let mut current = self.link(terminal).map(|_| terminal);
        while let Some(id) = current {
            path.push(id);
            current = self.parent(id);
        }
        path.reverse();
        path
    }

    /// True if any link from `terminal` up to the root holds a non-noop guard.
    pub fn has_custom_guard(&self, terminal: LinkId) -> bool {
        let mut current = self.link(terminal).map(|_| terminal);
        while let Some(id) = current {
            let entry = &self.links[id.0];
            if !entry.guard.is_noop() {
                return true;
            }
            current = entry.parent;
        }
        false
    }

    /// Evaluate guards from the root down to `terminal`.
    ///
    /// The terminal link's own guard fires only if its run-on-same-node flag is
    /// set. The first abort is returned immediately; no link below it runs.
    pub fn execute(
        &self,
        ctx: &mut ArgumentContext,
        terminal: LinkId,
    ) -> Result<GuardResult, CommandError> {
        if self.link(terminal).is_none() {
            return Err(CommandError::UnknownLink { link: terminal.0 });
        }
        self.execute_from(ctx, terminal, terminal)
    }

    fn execute_from(
        &self,
        ctx: &mut ArgumentContext,
        link: LinkId,
        terminal: LinkId,
    ) -> Result<GuardResult, CommandError> {
        let entry = &self.links[link.0];
        if let Some(parent) = entry.parent {
            let result = self.execute_from(ctx, parent, terminal)?;
            if !result.is_continue() {
                return Ok(result);
            }
        }

        if entry.guard.is_noop() {
            return Ok(GuardResult::Continue);
        }
        if link == terminal && !entry.run_on_same_node {
            trace!(link = link.0, "skipping guard on its own node");
            return Ok(GuardResult::Continue);
        }

        trace!(link = link.0, command = ctx.command(), "running guard");
        let result = entry.guard.check(ctx)?;
        if let GuardResult::Abort(code) = result {
            debug!(
                link = link.0,
                code,
                command = ctx.command(),
                "guard aborted"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::ParsedArguments;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> ArgumentContext {
        ArgumentContext::new(Arc::new(ParsedArguments::new()))
    }

    fn counting(counter: &Arc<AtomicUsize>, result: GuardResult) -> GuardHandle {
        let counter = Arc::clone(counter);
        GuardHandle::from_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(result)
        })
    }

    #[test]
    fn extend_creates_child_of_parent() {
        let mut chain = GuardChain::new();
        let a = chain.extend(chain.root()).unwrap();
        let b = chain.extend(a).unwrap();
        assert_eq!(chain.parent(b), Some(a));
        assert_eq!(chain.parent(a), Some(chain.root()));
        assert_eq!(chain.parent(chain.root()), None);
        assert_eq!(chain.path(b), vec![chain.root(), a, b]);
        assert!(chain.runs_on_same_node(b));
    }

    #[test]
    fn extend_rejects_unknown_parent() {
        let mut chain = GuardChain::new();
        assert_eq!(
            chain.extend(LinkId(9)).unwrap_err(),
            BuildError::UnknownLink { link: 9 }
        );
    }

    #[test]
    fn second_assignment_fails() {
        let mut chain = GuardChain::new();
        let link = chain.extend(chain.root()).unwrap();
        chain
            .assign(
                link,
                GuardHandle::from_fn(|_| Ok(GuardResult::Continue)),
                true,
            )
            .unwrap();
        let err = chain
            .assign(
                link,
                GuardHandle::from_fn(|_| Ok(GuardResult::Continue)),
                true,
            )
            .unwrap_err();
        assert_eq!(err, BuildError::GuardAlreadyAssigned { link: link.index() });
    }

    #[test]
    fn custom_guard_detection_walks_to_root() {
        let mut chain = GuardChain::new();
        let a = chain.extend(chain.root()).unwrap();
        let b = chain.extend(a).unwrap();
        let sibling = chain.extend(chain.root()).unwrap();
        assert!(!chain.has_custom_guard(b));

        chain
            .assign(a, GuardHandle::from_fn(|_| Ok(GuardResult::Continue)), true)
            .unwrap();
        assert!(chain.has_custom_guard(b));
        assert!(chain.has_custom_guard(a));
        assert!(!chain.has_custom_guard(sibling));
    }

    #[test]
    fn unguarded_path_continues_without_running_guards() {
        let mut chain = GuardChain::new();
        let a = chain.extend(chain.root()).unwrap();
        let leaf = chain.extend(a).unwrap();
        let sibling = chain.extend(a).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        chain
            .assign(sibling, counting(&count, GuardResult::abort()), true)
            .unwrap();

        assert_eq!(
            chain.execute(&mut ctx(), leaf).unwrap(),
            GuardResult::Continue
        );
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn explicit_noop_assignment_is_not_custom() {
        let mut chain = GuardChain::new();
        let a = chain.extend(chain.root()).unwrap();
        chain.assign(a, GuardHandle::noop(), true).unwrap();
        assert!(!chain.has_custom_guard(a));
    }

    #[test]
    fn guards_run_root_to_leaf() {
        let mut chain = GuardChain::new();
        let a = chain.extend(chain.root()).unwrap();
        let b = chain.extend(a).unwrap();
        for (link, label) in [(chain.root(), "root"), (a, "a"), (b, "b")] {
            chain
                .assign(
                    link,
                    GuardHandle::from_fn(move |ctx| {
                        let mut seen = ctx.get_optional::<String>("order")?.unwrap_or_default();
                        seen.push_str(label);
                        seen.push(';');
                        ctx.set("order", seen);
                        Ok(GuardResult::Continue)
                    }),
                    true,
                )
                .unwrap();
        }
        let mut ctx = ctx();
        ctx.set("order", String::new());
        assert_eq!(chain.execute(&mut ctx, b).unwrap(), GuardResult::Continue);
        assert_eq!(ctx.get::<String>("order").unwrap(), "root;a;b;");
    }

    #[test]
    fn abort_skips_descendants() {
        let mut chain = GuardChain::new();
        let a = chain.extend(chain.root()).unwrap();
        let b = chain.extend(a).unwrap();
        let above = Arc::new(AtomicUsize::new(0));
        let below = Arc::new(AtomicUsize::new(0));
        chain
            .assign(chain.root(), counting(&above, GuardResult::Continue), true)
            .unwrap();
        chain
            .assign(a, counting(&above, GuardResult::Abort(4)), true)
            .unwrap();
        chain
            .assign(b, counting(&below, GuardResult::Continue), true)
            .unwrap();

        assert_eq!(chain.execute(&mut ctx(), b).unwrap(), GuardResult::Abort(4));
        assert_eq!(above.load(Ordering::SeqCst), 2);
        assert_eq!(below.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn terminal_guard_respects_run_on_same_node() {
        let mut chain = GuardChain::new();
        let a = chain.extend(chain.root()).unwrap();
        let b = chain.extend(a).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        chain
            .assign(a, counting(&count, GuardResult::abort()), false)
            .unwrap();

        assert_eq!(chain.execute(&mut ctx(), a).unwrap(), GuardResult::Continue);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(chain.execute(&mut ctx(), b).unwrap(), GuardResult::abort());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_terminal_is_an_error() {
        let chain = GuardChain::new();
        assert!(matches!(
            chain.execute(&mut ctx(), LinkId(3)),
            Err(CommandError::UnknownLink { link: 3 })
        ));
        assert!(!chain.has_custom_guard(LinkId(3)));
        assert!(chain.path(LinkId(3)).is_empty());
    }
}
