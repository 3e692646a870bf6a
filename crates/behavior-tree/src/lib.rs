//! Command-queue-driven behavior tree interpreter.
//!
//! Trees are declared as [`NodeTemplate`]s, flattened into an arena of
//! [`NodeCell`]s, and driven by [`BehaviorTreeEngine`] popping commands off
//! a FIFO queue. No node logic ever calls other node logic, so execution
//! never recurses and tree depth is unbounded.
//!
//! Leaf work is where async enters: action nodes spawn their handlers on
//! the tokio runtime and report back through a completion channel, which
//! the engine folds back into the queue between commands.
//!
//! Node kinds are resolved to their logic through the `dispatch-engine`
//! crate's enum strategy, keeping the kind-to-behavior table data, not a
//! hard-coded match.

pub mod action;
pub mod builder;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod logic;
pub mod node;
pub mod runtime;
pub mod status;

pub use action::{ActionContext, ActionHandler, ActionHandlerRegistry};
pub use builder::TreeBuilder;
pub use dispatcher::NodeKindDispatcher;
pub use engine::{BehaviorTreeEngine, DrainOutcome};
pub use error::TreeError;
pub use evaluator::{value_truthy, ExpressionEvaluator, VarMap};
pub use node::{
    Command, CommandKind, ExpressionConfig, NodeCell, NodeConfig, NodeKind, NodeTemplate, NodeType,
};
pub use runtime::{ErrorRecord, LeafTicket, RuntimeOptions, TreeRuntime};
pub use status::{BehaviorResult, NodeStatus};
