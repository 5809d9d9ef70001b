use std::time::Duration;

use arbor_blackboard::{BlackboardError, RegistrationError};
use thiserror::Error;

/// Tree startup failed. No part of the tree may be ticked after this.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Blackboard(#[from] BlackboardError),

    #[error("'{node}': {reason}")]
    InvalidConfiguration { node: String, reason: String },

    #[error("setup of '{node}' failed: {source}")]
    Node {
        node: String,
        #[source]
        source: Box<SetupError>,
    },

    #[error("setup timed out after {elapsed:?} (limit {timeout:?})")]
    Timeout { timeout: Duration, elapsed: Duration },

    #[error("{} nodes failed setup", .0.len())]
    Aggregate(Vec<SetupError>),
}

impl SetupError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// A node's `update()` failed outright. Fatal to the current tick.
///
/// Ordinary failure is `Ok(Status::Failure)`, not this.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Blackboard(#[from] BlackboardError),

    #[error("'{node}' returned INVALID from update")]
    InvalidStatus { node: String },

    #[error("'{node}' failed to update: {source}")]
    Node {
        node: String,
        #[source]
        source: Box<UpdateError>,
    },
}

impl UpdateError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Name of the innermost node the error was raised in, if known.
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::Node { node, source } => source.node().or(Some(node.as_str())),
            Self::InvalidStatus { node } => Some(node.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TickError {
    #[error("tree has not been set up")]
    NotSetUp,

    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// Errors assembling a subtree from an idiom.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("{conditions} conditions given for {subtrees} subtrees")]
    Mismatch { conditions: usize, subtrees: usize },

    #[error("{0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, UpdateError>;
