//! Per-kind node logic.
//!
//! Logic objects are stateless: all tree state lives in the runtime, and
//! logic never calls other logic. Progress happens exclusively by pushing
//! commands, which keeps the interpreter iterative at any tree depth.

mod action;
mod condition;
mod selector;
mod sequence;
mod until;

pub use action::ActionLogic;
pub use condition::ConditionLogic;
pub use selector::SelectorLogic;
pub use sequence::SequenceLogic;
pub use until::UntilLogic;

use crate::error::TreeError;
use crate::node::{Command, NodeConfig, NodeType};
use crate::runtime::TreeRuntime;
use crate::status::BehaviorResult;

/// Behavior of one node kind.
pub trait NodeLogic<T: NodeType, C: NodeConfig>: Send + Sync {
    /// The node is entered for the first time in this pass.
    fn visit(&self, rt: &mut TreeRuntime<T, C>, key: &str) -> Result<(), TreeError>;

    /// A direct child subtree finished.
    fn on_child_finish(
        &self,
        rt: &mut TreeRuntime<T, C>,
        key: &str,
        result: BehaviorResult,
        child_index: usize,
    ) -> Result<(), TreeError>;

    /// The node's own leaf work finished.
    fn on_leaf_finish(
        &self,
        rt: &mut TreeRuntime<T, C>,
        key: &str,
        result: BehaviorResult,
    ) -> Result<(), TreeError>;
}

/// First child still in `Init`, with its index.
pub(crate) fn first_init_child<T: NodeType, C: NodeConfig>(
    rt: &TreeRuntime<T, C>,
    parent_key: &str,
) -> Result<Option<(usize, String)>, TreeError> {
    next_init_child_from(rt, parent_key, 0)
}

/// First `Init` child strictly after `after`.
pub(crate) fn next_init_child<T: NodeType, C: NodeConfig>(
    rt: &TreeRuntime<T, C>,
    parent_key: &str,
    after: usize,
) -> Result<Option<(usize, String)>, TreeError> {
    next_init_child_from(rt, parent_key, after + 1)
}

fn next_init_child_from<T: NodeType, C: NodeConfig>(
    rt: &TreeRuntime<T, C>,
    parent_key: &str,
    from: usize,
) -> Result<Option<(usize, String)>, TreeError> {
    let parent = rt.node(parent_key)?;
    for (index, child_key) in parent.children.iter().enumerate().skip(from) {
        let child = rt.node(child_key)?;
        if child.status.is_executable() {
            return Ok(Some((index, child_key.clone())));
        }
    }
    Ok(None)
}

/// Marks every still-`Init` child from `from` onward as `Omitted`.
pub(crate) fn omit_remaining<T: NodeType, C: NodeConfig>(
    rt: &mut TreeRuntime<T, C>,
    parent_key: &str,
    from: usize,
) -> Result<(), TreeError> {
    let children: Vec<String> = rt.node(parent_key)?.children[from..].to_vec();
    for child_key in children {
        if rt.node(&child_key)?.status.is_executable() {
            rt.set_status(&child_key, crate::status::NodeStatus::Omitted)?;
        }
    }
    Ok(())
}

/// Tells the parent this subtree finished. A finished root ends the pass,
/// so it has nobody to notify.
pub(crate) fn notify_parent<T: NodeType, C: NodeConfig>(
    rt: &mut TreeRuntime<T, C>,
    node_key: &str,
    result: BehaviorResult,
) -> Result<(), TreeError> {
    let Some(parent_key) = rt.node(node_key)?.parent.clone() else {
        return Ok(());
    };
    let parent = rt
        .try_node(&parent_key)
        .ok_or_else(|| TreeError::ParentNotFound {
            parent: parent_key.clone(),
            child: node_key.to_string(),
        })?;
    let child_index = parent
        .children
        .iter()
        .position(|c| c == node_key)
        .ok_or_else(|| TreeError::ChildNotInParent {
            parent: parent_key.clone(),
            child: node_key.to_string(),
        })?;
    rt.push_command(Command::finish_child(parent_key, result, child_index));
    Ok(())
}
