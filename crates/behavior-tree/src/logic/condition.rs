//! Condition leaf: evaluates an expression to success or failure.

use tracing::warn;

use crate::error::TreeError;
use crate::evaluator::value_truthy;
use crate::node::{Command, CommandKind, ExpressionConfig, NodeConfig, NodeKind, NodeType};
use crate::runtime::TreeRuntime;
use crate::status::{BehaviorResult, NodeStatus};

use super::{notify_parent, NodeLogic};

pub struct ConditionLogic;

impl<T: NodeType, C: NodeConfig> NodeLogic<T, C> for ConditionLogic {
    fn visit(&self, rt: &mut TreeRuntime<T, C>, key: &str) -> Result<(), TreeError> {
        rt.set_status(key, NodeStatus::Started)?;
        let expression = rt.node(key)?.config.expression().to_string();
        // An evaluation error counts as a false condition, not a tree error.
        let met = match rt.eval_expression(&expression, key) {
            Ok(value) => value_truthy(&value),
            Err(error) => {
                warn!(node = %key, %error, "condition evaluation failed, treating as false");
                rt.record_error(key, &error);
                false
            }
        };
        let result = if met {
            BehaviorResult::Success
        } else {
            BehaviorResult::Failure
        };
        rt.push_command(Command::finish_leaf(key, result));
        Ok(())
    }

    fn on_child_finish(
        &self,
        _rt: &mut TreeRuntime<T, C>,
        key: &str,
        _result: BehaviorResult,
        _child_index: usize,
    ) -> Result<(), TreeError> {
        Err(TreeError::InvalidTransition {
            kind: NodeKind::Condition,
            key: key.to_string(),
            command: CommandKind::FinishChildNode,
        })
    }

    fn on_leaf_finish(
        &self,
        rt: &mut TreeRuntime<T, C>,
        key: &str,
        result: BehaviorResult,
    ) -> Result<(), TreeError> {
        rt.set_status(key, result.into_status())?;
        notify_parent(rt, key, result)
    }
}
