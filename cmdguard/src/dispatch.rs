//! Execution glue: run a matched node's guard chain, then its handler.

use std::any::Any;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::DispatchConfig;
use crate::core::context::ArgumentContext;
use crate::core::guard::GuardResult;
use crate::core::value::ParsedArguments;
use crate::error::{ArgumentError, CommandError};
use crate::tree::{CommandTree, NodeId};

/// What the external parser hands over for one invocation.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub node: NodeId,
    pub arguments: Arc<ParsedArguments>,
}

impl ParseResult {
    pub fn new(node: NodeId, arguments: ParsedArguments) -> Self {
        Self {
            node,
            arguments: Arc::new(arguments),
        }
    }
}

/// Read-only view a handler runs against.
pub struct Invocation<'a> {
    context: &'a ArgumentContext,
    dispatcher: &'a Dispatcher,
}

impl<'a> Invocation<'a> {
    pub fn context(&self) -> &'a ArgumentContext {
        self.context
    }

    pub fn dispatcher(&self) -> &'a Dispatcher {
        self.dispatcher
    }

    pub fn get<T: Any + Clone>(&self, name: &str) -> Result<T, ArgumentError> {
        self.context.get(name)
    }

    pub fn get_optional<T: Any + Clone>(&self, name: &str) -> Result<Option<T>, ArgumentError> {
        self.context.get_optional(name)
    }

    /// Execute another command from inside this handler.
    ///
    /// The nested command reads its own parsed arguments and sees this
    /// invocation's overrides for every other name. Anything its guards
    /// change stays in its own context.
    pub fn execute_nested(&self, parse: &ParseResult) -> Result<i32, CommandError> {
        self.dispatcher.execute_nested(parse, self.context)
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    tree: Arc<CommandTree>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(tree: CommandTree, config: DispatchConfig) -> Self {
        Self {
            tree: Arc::new(tree),
            config,
        }
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Execute a top-level invocation and return its result code.
    ///
    /// A guard abort is returned as `Ok(code)` without running the handler.
    pub fn execute(&self, parse: &ParseResult) -> Result<i32, CommandError> {
        let command = self.command_of(parse.node)?;
        let ctx = ArgumentContext::for_command(Arc::clone(&parse.arguments), command);
        self.run(parse.node, ctx)
    }

    /// Execute `parse` beneath an invocation whose context is `parent`.
    pub fn execute_nested(
        &self,
        parse: &ParseResult,
        parent: &ArgumentContext,
    ) -> Result<i32, CommandError> {
        if parent.depth() >= self.config.max_nesting_depth {
            return Err(CommandError::NestingTooDeep {
                limit: self.config.max_nesting_depth,
            });
        }
        let command = self.command_of(parse.node)?;
        let ctx = parent.nested(Arc::clone(&parse.arguments), command);
        self.run(parse.node, ctx)
    }

    fn command_of(&self, node: NodeId) -> Result<Arc<str>, CommandError> {
        self.tree
            .node(node)
            .map(|entry| entry.command_arc())
            .ok_or(CommandError::UnknownNode { node: node.index() })
    }

    #[instrument(level = "debug", skip_all, fields(command = ctx.command(), depth = ctx.depth()))]
    fn run(&self, node: NodeId, mut ctx: ArgumentContext) -> Result<i32, CommandError> {
        let entry = self
            .tree
            .node(node)
            .ok_or(CommandError::UnknownNode { node: node.index() })?;
        let handler = entry.handler().ok_or_else(|| CommandError::NotExecutable {
            command: entry.command().to_string(),
        })?;
        let chain = self.tree.chain();

        if self.config.fast_path && !chain.has_custom_guard(entry.link()) {
            debug!("no guard on path, invoking handler directly");
            return handler(&Invocation {
                context: &ctx,
                dispatcher: self,
            });
        }

        match chain.execute(&mut ctx, entry.link())? {
            GuardResult::Abort(code) => {
                debug!(code, "invocation aborted by guard");
                Ok(code)
            }
            GuardResult::Continue => {
                debug!(overrides = ?ctx.overrides(), "guards passed");
                handler(&Invocation {
                    context: &ctx,
                    dispatcher: self,
                })
            }
        }
    }
}
