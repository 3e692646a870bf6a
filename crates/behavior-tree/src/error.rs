//! Interpreter errors.

use thiserror::Error;

use crate::node::{CommandKind, NodeKind};

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("node not found: {key}")]
    NodeNotFound { key: String },

    #[error("parent {parent} of node {child} not found")]
    ParentNotFound { parent: String, child: String },

    #[error("node {child} is not a child of {parent}")]
    ChildNotInParent { parent: String, child: String },

    #[error("{kind} node {key} cannot handle {command} commands")]
    InvalidTransition {
        kind: NodeKind,
        key: String,
        command: CommandKind,
    },

    #[error("no logic registered for node kind {kind}")]
    UnhandledKind { kind: NodeKind },
}
