//! The interpreter loop.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::action::ActionHandlerRegistry;
use crate::dispatcher::NodeKindDispatcher;
use crate::error::TreeError;
use crate::node::{Command, CommandKind, NodeConfig, NodeKind, NodeType};
use crate::runtime::TreeRuntime;
use crate::status::{BehaviorResult, NodeStatus};

/// What a single drain of the command queue left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The tree finished: the root reached a terminal status.
    Idle,
    /// The queue is empty but leaf work is still outstanding.
    StillRunning,
}

/// Drives a [`TreeRuntime`] by draining its command queue.
///
/// The engine owns no tree state. Each command is resolved to node logic
/// through the kind dispatcher and applied; logic errors are recorded on the
/// runtime and the loop keeps going, leaving the node's status as it was.
pub struct BehaviorTreeEngine<T, C> {
    dispatcher: NodeKindDispatcher<T, C>,
}

impl<T: NodeType, C: NodeConfig> BehaviorTreeEngine<T, C> {
    pub fn new(registry: Arc<ActionHandlerRegistry<T, C>>) -> Self {
        Self {
            dispatcher: NodeKindDispatcher::new(registry),
        }
    }

    /// Resets the runtime and drains the initial root visit.
    pub async fn start(&self, rt: &mut TreeRuntime<T, C>) -> Result<DrainOutcome, TreeError> {
        rt.initialize_state();
        rt.push_command(Command::visit(rt.root_key().to_string()));
        self.drain(rt).await
    }

    /// Drains the queue until it is empty, folding in any leaf completions
    /// that have already arrived.
    pub async fn drain(&self, rt: &mut TreeRuntime<T, C>) -> Result<DrainOutcome, TreeError> {
        loop {
            rt.poll_completions();
            let Some(command) = rt.pop_command() else {
                break;
            };
            let iteration = rt.bump_iteration();
            debug!(iteration, kind = %command.kind, node = %command.node_key, "processing");

            let Ok(node) = rt.node(&command.node_key) else {
                // Dangling commands are dropped, not fatal.
                error!(node = %command.node_key, "dropping command for unknown node");
                continue;
            };
            let kind = node.kind;
            let logic = self.dispatcher.resolve(kind).await?;

            let applied = match command.kind {
                CommandKind::VisitNode => logic.visit(rt, &command.node_key),
                CommandKind::FinishLeafNode => logic.on_leaf_finish(
                    rt,
                    &command.node_key,
                    command.result.unwrap_or(BehaviorResult::Failure),
                ),
                CommandKind::FinishChildNode => logic.on_child_finish(
                    rt,
                    &command.node_key,
                    command.result.unwrap_or(BehaviorResult::Failure),
                    command.child_index.unwrap_or(0),
                ),
            };
            if let Err(err) = applied {
                error!(node = %command.node_key, %err, "node logic failed");
                rt.record_error(command.node_key.clone(), &err);
            }
        }

        if rt.is_complete() {
            Ok(DrainOutcome::Idle)
        } else {
            Ok(DrainOutcome::StillRunning)
        }
    }

    /// Runs a full pass to completion, waiting on outstanding leaf work
    /// between drains.
    ///
    /// Returns `Running` when the tree cannot make further progress: the
    /// queue is empty, no leaf work is in flight, and the root has not
    /// settled.
    pub async fn run_to_completion(
        &self,
        rt: &mut TreeRuntime<T, C>,
    ) -> Result<BehaviorResult, TreeError> {
        rt.initialize_state();
        rt.push_command(Command::visit(rt.root_key().to_string()));

        loop {
            match self.drain(rt).await? {
                DrainOutcome::Idle => break,
                DrainOutcome::StillRunning => {}
            }

            rt.poll_completions();
            if rt.has_pending_commands() {
                continue;
            }

            if rt.in_flight() == 0 {
                // The last ticket drops only after its completion is sent,
                // so one more poll settles the race.
                rt.poll_completions();
                if rt.has_pending_commands() {
                    continue;
                }
                info!(root = %rt.root_key(), "tree stalled with no outstanding work");
                break;
            }

            if !rt.recv_completion().await {
                break;
            }
        }

        Ok(rt.result())
    }

    /// The node currently executing: the deepest `Started` node along the
    /// leftmost started branch, if any.
    pub fn current_node<'rt>(
        &self,
        rt: &'rt TreeRuntime<T, C>,
    ) -> Option<&'rt crate::node::NodeCell<T, C>> {
        let mut current = rt.try_node(rt.root_key())?;
        if current.status != NodeStatus::Started {
            return None;
        }
        'descend: loop {
            for child_key in &current.children {
                if let Some(child) = rt.try_node(child_key)
                    && child.status == NodeStatus::Started
                {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Whether this engine can execute the given node kind.
    pub async fn supports(&self, kind: NodeKind) -> bool {
        self.dispatcher.resolve(kind).await.is_ok()
    }
}
