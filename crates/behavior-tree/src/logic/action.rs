//! Action leaf: runs a registered async handler off the interpreter loop.

use std::sync::Arc;

use tracing::{error, warn};

use crate::action::{ActionContext, ActionHandlerRegistry};
use crate::error::TreeError;
use crate::node::{Command, CommandKind, NodeConfig, NodeKind, NodeType};
use crate::runtime::TreeRuntime;
use crate::status::{BehaviorResult, NodeStatus};

use super::{notify_parent, NodeLogic};

pub struct ActionLogic<T, C> {
    registry: Arc<ActionHandlerRegistry<T, C>>,
}

impl<T, C> ActionLogic<T, C> {
    pub fn new(registry: Arc<ActionHandlerRegistry<T, C>>) -> Self {
        Self { registry }
    }
}

impl<T: NodeType, C: NodeConfig> NodeLogic<T, C> for ActionLogic<T, C> {
    fn visit(&self, rt: &mut TreeRuntime<T, C>, key: &str) -> Result<(), TreeError> {
        rt.set_status(key, NodeStatus::Started)?;
        let node = rt.node(key)?.clone();

        let Some(handler) = self.registry.get(&node.node_type) else {
            error!(node = %key, node_type = ?node.node_type, "no action handler registered");
            rt.record_error(key, format!("no handler for node type {:?}", node.node_type));
            rt.push_command(Command::finish_leaf(key, BehaviorResult::Failure));
            return Ok(());
        };

        let ctx = ActionContext::new(node, rt.vars_handle(), rt.evaluator_handle());
        let finish_tx = rt.finish_sender();
        let ticket = rt.leaf_ticket();
        let node_key = key.to_string();

        // The handler runs on its own task; a second task folds its outcome,
        // including a panic, into a completion. The ticket drops after the
        // send so the engine never sees zero in-flight with the completion
        // still unsent.
        let work = tokio::spawn(async move { handler.execute(ctx).await });
        tokio::spawn(async move {
            let result = match work.await {
                Ok(Ok(result)) => result,
                Ok(Err(error)) => {
                    warn!(node = %node_key, %error, "action handler failed");
                    BehaviorResult::Failure
                }
                Err(join_error) => {
                    error!(node = %node_key, %join_error, "action handler task aborted");
                    BehaviorResult::Failure
                }
            };
            let _ = finish_tx.send(Command::finish_leaf(node_key, result));
            drop(ticket);
        });
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
            kind: NodeKind::Action,
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
        // A Running result settles the leaf as Failure, but the parent is
        // notified with the raw result so composites can stall on it.
        rt.set_status(key, result.into_status())?;
        notify_parent(rt, key, result)
    }
}
