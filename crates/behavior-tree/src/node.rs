//! Node kinds, templates, arena cells, and queue commands.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::status::{BehaviorResult, NodeStatus};

/// Structural kind of a tree node.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
pub enum NodeKind {
    /// Runs children in order; fails on the first child failure.
    Sequence,
    /// Runs children in order; succeeds on the first child success.
    Selector,
    /// Leaf that evaluates an expression to success or failure.
    Condition,
    /// Leaf that runs a registered async handler.
    Action,
    /// Repeats its children until its expression becomes true.
    Until,
}

impl NodeKind {
    pub fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Condition | NodeKind::Action)
    }
}

/// Domain label attached to a node, used to look up action handlers.
///
/// Blanket-implemented for any type with the required bounds.
pub trait NodeType: Clone + Eq + Hash + Debug + Send + Sync + 'static {}
impl<T: Clone + Eq + Hash + Debug + Send + Sync + 'static> NodeType for T {}

/// Per-node configuration carried by condition and until nodes.
pub trait ExpressionConfig {
    /// The boolean expression this node evaluates, empty when none applies.
    fn expression(&self) -> &str;
}

/// Bounds required of node configuration payloads.
pub trait NodeConfig: ExpressionConfig + Clone + Send + Sync + 'static {}
impl<C: ExpressionConfig + Clone + Send + Sync + 'static> NodeConfig for C {}

/// Declarative tree shape handed to [`TreeRuntime::new`].
///
/// [`TreeRuntime::new`]: crate::runtime::TreeRuntime::new
#[derive(Debug, Clone)]
pub struct NodeTemplate<T, C> {
    pub key: String,
    pub kind: NodeKind,
    pub node_type: T,
    pub config: C,
    pub children: Vec<NodeTemplate<T, C>>,
}

/// One node in the flattened arena.
///
/// Children and parent are referenced by key, so cells never borrow each
/// other and the interpreter stays iterative.
#[derive(Debug, Clone)]
pub struct NodeCell<T, C> {
    pub key: String,
    pub kind: NodeKind,
    pub node_type: T,
    pub status: NodeStatus,
    pub config: C,
    pub children: Vec<String>,
    pub parent: Option<String>,
}

impl<T: Clone, C: Clone> NodeCell<T, C> {
    /// Flattens a template tree into arena cells, returning the root key.
    pub fn flatten(template: &NodeTemplate<T, C>) -> (String, HashMap<String, NodeCell<T, C>>) {
        let mut cells = HashMap::new();
        Self::flatten_into(template, None, &mut cells);
        (template.key.clone(), cells)
    }

    fn flatten_into(
        template: &NodeTemplate<T, C>,
        parent: Option<&str>,
        cells: &mut HashMap<String, NodeCell<T, C>>,
    ) {
        let cell = NodeCell {
            key: template.key.clone(),
            kind: template.kind,
            node_type: template.node_type.clone(),
            status: NodeStatus::Init,
            config: template.config.clone(),
            children: template.children.iter().map(|c| c.key.clone()).collect(),
            parent: parent.map(str::to_string),
        };
        cells.insert(cell.key.clone(), cell);
        for child in &template.children {
            Self::flatten_into(child, Some(&template.key), cells);
        }
    }
}

/// What a queued command asks the interpreter to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum CommandKind {
    /// Enter a node for the first time in this pass.
    VisitNode,
    /// A leaf's async work finished with a result.
    FinishLeafNode,
    /// A child subtree finished; the parent decides what happens next.
    FinishChildNode,
}

/// A unit of work in the runtime's FIFO queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    pub node_key: String,
    /// Present on finish commands.
    pub result: Option<BehaviorResult>,
    /// Index of the finished child within the parent, present on
    /// `FinishChildNode`.
    pub child_index: Option<usize>,
}

impl Command {
    pub fn visit(node_key: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::VisitNode,
            node_key: node_key.into(),
            result: None,
            child_index: None,
        }
    }

    pub fn finish_leaf(node_key: impl Into<String>, result: BehaviorResult) -> Self {
        Self {
            kind: CommandKind::FinishLeafNode,
            node_key: node_key.into(),
            result: Some(result),
            child_index: None,
        }
    }

    pub fn finish_child(
        node_key: impl Into<String>,
        result: BehaviorResult,
        child_index: usize,
    ) -> Self {
        Self {
            kind: CommandKind::FinishChildNode,
            node_key: node_key.into(),
            result: Some(result),
            child_index: Some(child_index),
        }
    }
}
