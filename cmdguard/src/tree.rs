//! Command tree construction glue.
//!
//! Every node owns one guard-chain link, created by extending its parent's
//! link. Once [`CommandTreeBuilder::build`] returns, the tree and its chain
//! are read-only and can be shared across threads.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::core::chain::{GuardChain, LinkId};
use crate::core::guard::GuardHandle;
use crate::core::reference::ArgumentRef;
use crate::core::value::ArgType;
use crate::dispatch::Invocation;
use crate::error::{BuildError, CommandError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Literal,
    /// Argument node; the parser stores its value under the node name.
    Argument(ArgType),
}

pub(crate) type Handler = Arc<dyn Fn(&Invocation<'_>) -> Result<i32, CommandError> + Send + Sync>;

pub struct Node {
    name: String,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    link: LinkId,
    /// Space-separated names from the root, root excluded.
    command: Arc<str>,
    handler: Option<Handler>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn link(&self) -> LinkId {
        self.link
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub(crate) fn command_arc(&self) -> Arc<str> {
        Arc::clone(&self.command)
    }

    pub fn is_executable(&self) -> bool {
        self.handler.is_some()
    }

    pub(crate) fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("link", &self.link)
            .field("executable", &self.handler.is_some())
            .finish()
    }
}

pub struct CommandTreeBuilder {
    nodes: Vec<Node>,
    chain: GuardChain,
}

impl Default for CommandTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTreeBuilder {
    pub fn new() -> Self {
        let chain = GuardChain::new();
        let root = Node {
            name: String::new(),
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
            link: chain.root(),
            command: Arc::from(""),
            handler: None,
        };
        Self {
            nodes: vec![root],
            chain,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node(&self, id: NodeId) -> Result<&Node, BuildError> {
        self.nodes
            .get(id.0)
            .ok_or(BuildError::UnknownNode { node: id.0 })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, BuildError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(BuildError::UnknownNode { node: id.0 })
    }

    pub fn literal(&mut self, parent: NodeId, name: &str) -> Result<NodeId, BuildError> {
        self.add_child(parent, name, NodeKind::Literal)
    }

    pub fn argument<T: Any>(&mut self, parent: NodeId, name: &str) -> Result<NodeId, BuildError> {
        self.add_child(parent, name, NodeKind::Argument(ArgType::of::<T>()))
    }

    fn add_child(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
    ) -> Result<NodeId, BuildError> {
        let parent_node = self.node(parent)?;
        if parent_node
            .children
            .iter()
            .any(|child| self.nodes[child.0].name == name)
        {
            return Err(BuildError::DuplicateChild {
                parent: parent_node.command.to_string(),
                name: name.to_string(),
            });
        }
        let command: Arc<str> = if parent_node.command.is_empty() {
            Arc::from(name)
        } else {
            Arc::from(format!("{} {}", parent_node.command, name))
        };
        let parent_link = parent_node.link;
        let link = self.chain.extend(parent_link)?;

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            kind,
            parent: Some(parent),
            children: Vec::new(),
            link,
            command,
            handler: None,
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Guard `node` and everything below it.
    pub fn guard(&mut self, node: NodeId, guard: GuardHandle) -> Result<(), BuildError> {
        let link = self.node(node)?.link;
        self.chain.assign(link, guard, true)
    }

    /// Guard everything below `node`, but not executions of `node` itself.
    pub fn guard_descendants(
        &mut self,
        node: NodeId,
        guard: GuardHandle,
    ) -> Result<(), BuildError> {
        let link = self.node(node)?.link;
        self.chain.assign(link, guard, false)
    }

    pub fn executes<F>(&mut self, node: NodeId, handler: F) -> Result<(), BuildError>
    where
        F: Fn(&Invocation<'_>) -> Result<i32, CommandError> + Send + Sync + 'static,
    {
        self.node_mut(node)?.handler = Some(Arc::new(handler));
        Ok(())
    }

    /// Bind a typed reference to the argument `name` declared on the path to `node`.
    ///
    /// Fails if no such argument exists there, or if it was declared with a
    /// type other than `T`.
    pub fn argument_ref<T: Any>(
        &self,
        node: NodeId,
        name: &str,
    ) -> Result<ArgumentRef<T>, BuildError> {
        let start = self.node(node)?;
        let mut current = Some(node);
        while let Some(id) = current {
            let entry = &self.nodes[id.0];
            if let NodeKind::Argument(declared) = entry.kind {
                if entry.name == name {
                    if !declared.is::<T>() {
                        return Err(BuildError::ArgumentTypeMismatch {
                            name: name.to_string(),
                            declared: declared.name(),
                            requested: std::any::type_name::<T>(),
                        });
                    }
                    return Ok(ArgumentRef::scoped(name, id));
                }
            }
            current = entry.parent;
        }
        Err(BuildError::UnknownArgument {
            name: name.to_string(),
            node: start.command.to_string(),
        })
    }

    pub fn build(self) -> CommandTree {
        CommandTree {
            nodes: self.nodes,
            chain: self.chain,
        }
    }
}

/// Read-only command tree with its guard chain.
pub struct CommandTree {
    nodes: Vec<Node>,
    chain: GuardChain,
}

impl CommandTree {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn chain(&self) -> &GuardChain {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `node` in declaration order. Empty for an unknown node.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node)
            .map(|entry| entry.children.as_slice())
            .unwrap_or_default()
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name)
    }

    /// Follow node names from the root.
    pub fn find(&self, names: &[&str]) -> Option<NodeId> {
        names
            .iter()
            .try_fold(self.root(), |node, name| self.child(node, name))
    }
}

impl fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTree")
            .field("nodes", &self.nodes)
            .field("links", &self.chain.len())
            .finish()
    }
}
