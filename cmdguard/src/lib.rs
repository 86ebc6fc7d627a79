//! Guard-chain middleware for command trees.
//!
//! Sits between an external command parser and the handlers that run parsed
//! commands. Guards attached along the tree run root-to-leaf before a handler
//! and may veto execution or rewrite the arguments the handler sees.
//!
//! - **[`core`]**: Pure logic (argument overlay, guards, guard chain, typed
//!   argument references). No I/O.
//! - **[`tree`]** / **[`dispatch`]**: Tree construction glue and the execution
//!   glue that runs a matched node's chain before its handler.
//! - **[`config`]**: Dispatcher configuration loaded from TOML.

pub mod codes;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tree;

pub use crate::core::chain::{GuardChain, LinkId};
pub use crate::core::context::ArgumentContext;
pub use crate::core::guard::{Guard, GuardHandle, GuardResult};
pub use crate::core::reference::ArgumentRef;
pub use crate::core::value::{ArgType, ArgValue, ParsedArguments};
pub use config::DispatchConfig;
pub use dispatch::{Dispatcher, Invocation, ParseResult};
pub use error::{ArgumentError, BuildError, CommandError};
pub use tree::{CommandTree, CommandTreeBuilder, Node, NodeId, NodeKind};
