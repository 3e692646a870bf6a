//! Until decorator: repeats its children until its expression holds.

use serde_json::json;
use tracing::warn;

use crate::error::TreeError;
use crate::evaluator::value_truthy;
use crate::node::{Command, CommandKind, ExpressionConfig, NodeConfig, NodeKind, NodeType};
use crate::runtime::TreeRuntime;
use crate::status::{BehaviorResult, NodeStatus};

use super::{first_init_child, next_init_child, notify_parent, omit_remaining, NodeLogic};

/// Hard cap on loop passes, guarding against conditions that never flip.
const MAX_UNTIL_ITERATIONS: i64 = 9999;

fn guard_counter_key(node_key: &str) -> String {
    format!("__until_iterations_{node_key}")
}

pub struct UntilLogic;

impl UntilLogic {
    fn condition_met<T: NodeType, C: NodeConfig>(
        rt: &mut TreeRuntime<T, C>,
        key: &str,
    ) -> Result<bool, TreeError> {
        let expression = rt.node(key)?.config.expression().to_string();
        match rt.eval_expression(&expression, key) {
            Ok(value) => Ok(value_truthy(&value)),
            Err(error) => {
                warn!(node = %key, %error, "until condition evaluation failed, treating as false");
                rt.record_error(key, &error);
                Ok(false)
            }
        }
    }

    fn finish<T: NodeType, C: NodeConfig>(
        rt: &mut TreeRuntime<T, C>,
        key: &str,
        result: BehaviorResult,
    ) -> Result<(), TreeError> {
        rt.set_status(key, result.into_status())?;
        notify_parent(rt, key, result)
    }

    /// Puts every descendant of the node back to `Init` for another pass.
    /// Iterative, matching the rest of the interpreter.
    fn reset_children<T: NodeType, C: NodeConfig>(
        rt: &mut TreeRuntime<T, C>,
        key: &str,
    ) -> Result<(), TreeError> {
        let mut stack: Vec<String> = rt.node(key)?.children.clone();
        while let Some(child_key) = stack.pop() {
            rt.set_status(&child_key, NodeStatus::Init)?;
            stack.extend(rt.node(&child_key)?.children.iter().cloned());
        }
        Ok(())
    }
}

impl<T: NodeType, C: NodeConfig> NodeLogic<T, C> for UntilLogic {
    fn visit(&self, rt: &mut TreeRuntime<T, C>, key: &str) -> Result<(), TreeError> {
        rt.set_status(key, NodeStatus::Started)?;
        if Self::condition_met(rt, key)? {
            return Self::finish(rt, key, BehaviorResult::Success);
        }
        match first_init_child(rt, key)? {
            Some((_, child_key)) => {
                rt.push_command(Command::visit(child_key));
                Ok(())
            }
            // Nothing in the body can ever make the condition true.
            None => Self::finish(rt, key, BehaviorResult::Failure),
        }
    }

    fn on_child_finish(
        &self,
        rt: &mut TreeRuntime<T, C>,
        key: &str,
        result: BehaviorResult,
        child_index: usize,
    ) -> Result<(), TreeError> {
        // A failing body aborts the loop outright.
        if result.is_failure() {
            rt.set_status(key, NodeStatus::Failure)?;
            omit_remaining(rt, key, child_index + 1)?;
            return notify_parent(rt, key, BehaviorResult::Failure);
        }

        // Success and Running both fall through to the condition check.
        if Self::condition_met(rt, key)? {
            rt.set_status(key, NodeStatus::Success)?;
            omit_remaining(rt, key, child_index + 1)?;
            return notify_parent(rt, key, BehaviorResult::Success);
        }

        if let Some((_, child_key)) = next_init_child(rt, key, child_index)? {
            rt.push_command(Command::visit(child_key));
            return Ok(());
        }

        // A full pass over the body is done; start another.
        let counter_key = guard_counter_key(key);
        let iterations = rt
            .get_var(&counter_key)
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
            + 1;
        rt.set_var(counter_key, json!(iterations));
        if iterations >= MAX_UNTIL_ITERATIONS {
            warn!(node = %key, iterations, "until loop hit iteration cap");
            rt.record_error(key, format!("iteration cap {MAX_UNTIL_ITERATIONS} reached"));
            return Self::finish(rt, key, BehaviorResult::Failure);
        }

        Self::reset_children(rt, key)?;
        match first_init_child(rt, key)? {
            Some((_, child_key)) => {
                rt.push_command(Command::visit(child_key));
                Ok(())
            }
            None => Self::finish(rt, key, BehaviorResult::Failure),
        }
    }

    fn on_leaf_finish(
        &self,
        _rt: &mut TreeRuntime<T, C>,
        key: &str,
        _result: BehaviorResult,
    ) -> Result<(), TreeError> {
        Err(TreeError::InvalidTransition {
            kind: NodeKind::Until,
            key: key.to_string(),
            command: CommandKind::FinishLeafNode,
        })
    }
}
