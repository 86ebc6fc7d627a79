//! Error taxonomy for argument lookup, tree construction and execution.
//!
//! An abort is not represented here: it is an expected outcome carried by
//! [`GuardResult::Abort`](crate::GuardResult::Abort).

use thiserror::Error;

/// Failure to read an argument from an [`ArgumentContext`](crate::ArgumentContext).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("argument '{name}' not found")]
    NotFound { name: String },

    #[error("argument '{name}' was removed by a guard")]
    Removed { name: String },

    /// The argument was explicitly overridden with "no value".
    #[error("argument '{name}' holds no value")]
    Absent { name: String },

    #[error("argument '{name}' has type {actual}, requested {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl ArgumentError {
    /// Name of the argument the failed lookup was for.
    pub fn name(&self) -> &str {
        match self {
            Self::NotFound { name }
            | Self::Removed { name }
            | Self::Absent { name }
            | Self::TypeMismatch { name, .. } => name,
        }
    }
}

/// Misuse detected while the command tree is being assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("chain link {link} already has a guard assigned")]
    GuardAlreadyAssigned { link: usize },

    #[error("chain link {link} does not exist")]
    UnknownLink { link: usize },

    #[error("node {node} does not exist")]
    UnknownNode { node: usize },

    #[error("'{parent}' already has a child named '{name}'")]
    DuplicateChild { parent: String, name: String },

    #[error("argument '{name}' supplied more than once")]
    DuplicateArgument { name: String },

    #[error("no argument '{name}' is declared on the path to '{node}'")]
    UnknownArgument { name: String, node: String },

    #[error("argument '{name}' is declared as {declared}, referenced as {requested}")]
    ArgumentTypeMismatch {
        name: String,
        declared: &'static str,
        requested: &'static str,
    },
}

/// Hard failure while running guards or a handler.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error("command '{command}' has no handler")]
    NotExecutable { command: String },

    #[error("node {node} does not exist")]
    UnknownNode { node: usize },

    #[error("chain link {link} does not exist")]
    UnknownLink { link: usize },

    #[error("nested execution exceeded depth {limit}")]
    NestingTooDeep { limit: u32 },

    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CommandError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
