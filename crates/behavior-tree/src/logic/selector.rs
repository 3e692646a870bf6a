//! Selector composite: the first child success wins.

use crate::error::TreeError;
use crate::node::{Command, CommandKind, NodeConfig, NodeKind, NodeType};
use crate::runtime::TreeRuntime;
use crate::status::{BehaviorResult, NodeStatus};

use super::{first_init_child, next_init_child, notify_parent, omit_remaining, NodeLogic};

pub struct SelectorLogic;

impl<T: NodeType, C: NodeConfig> NodeLogic<T, C> for SelectorLogic {
    fn visit(&self, rt: &mut TreeRuntime<T, C>, key: &str) -> Result<(), TreeError> {
        rt.set_status(key, NodeStatus::Started)?;
        match first_init_child(rt, key)? {
            Some((_, child_key)) => {
                rt.push_command(Command::visit(child_key));
                Ok(())
            }
            // A selector with nothing to select fails.
            None => {
                rt.set_status(key, NodeStatus::Failure)?;
                notify_parent(rt, key, BehaviorResult::Failure)
            }
        }
    }

    fn on_child_finish(
        &self,
        rt: &mut TreeRuntime<T, C>,
        key: &str,
        result: BehaviorResult,
        child_index: usize,
    ) -> Result<(), TreeError> {
        match result {
            BehaviorResult::Success => {
                rt.set_status(key, NodeStatus::Success)?;
                omit_remaining(rt, key, child_index + 1)?;
                notify_parent(rt, key, BehaviorResult::Success)
            }
            BehaviorResult::Failure => match next_init_child(rt, key, child_index)? {
                Some((_, child_key)) => {
                    rt.push_command(Command::visit(child_key));
                    Ok(())
                }
                None => {
                    rt.set_status(key, NodeStatus::Failure)?;
                    notify_parent(rt, key, BehaviorResult::Failure)
                }
            },
            // A Running child produces no transition here; the pass stalls
            // and the driver reports an overall Running result.
            BehaviorResult::Running => Ok(()),
        }
    }

    fn on_leaf_finish(
        &self,
        _rt: &mut TreeRuntime<T, C>,
        key: &str,
        _result: BehaviorResult,
    ) -> Result<(), TreeError> {
        Err(TreeError::InvalidTransition {
            kind: NodeKind::Selector,
            key: key.to_string(),
            command: CommandKind::FinishLeafNode,
        })
    }
}
