//! Tree runtime state: arena, variable store, command queue, completions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::error::TreeError;
use crate::evaluator::{ExpressionEvaluator, VarMap};
use crate::node::{Command, NodeCell, NodeConfig, NodeTemplate, NodeType};
use crate::status::{BehaviorResult, NodeStatus};

/// Tunables for a tree runtime.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Record every popped command for inspection after a run.
    pub enable_history: bool,
}

/// An error observed during a pass, recorded without stopping the run.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub node_key: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Keeps the in-flight leaf count honest: incremented when a leaf task is
/// spawned, decremented when the task drops it, on any exit path.
pub struct LeafTicket {
    counter: Arc<AtomicUsize>,
}

impl Drop for LeafTicket {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Release);
    }
}

/// Mutable state of one behavior tree instance.
///
/// The interpreter is non-recursive: node logic never calls other node
/// logic, it only pushes commands here. Async leaf completions arrive
/// through an internal channel and are folded back into the queue by
/// [`poll_completions`].
///
/// [`poll_completions`]: TreeRuntime::poll_completions
pub struct TreeRuntime<T, C> {
    options: RuntimeOptions,
    evaluator: Arc<dyn ExpressionEvaluator>,
    initial_vars: VarMap,
    vars: Arc<Mutex<VarMap>>,
    queue: VecDeque<Command>,
    history: Vec<Command>,
    nodes: HashMap<String, NodeCell<T, C>>,
    root_key: String,
    iteration_count: u64,
    errors: Vec<ErrorRecord>,
    finish_tx: UnboundedSender<Command>,
    finish_rx: UnboundedReceiver<Command>,
    in_flight: Arc<AtomicUsize>,
}

impl<T: NodeType, C: NodeConfig> TreeRuntime<T, C> {
    pub fn new(
        template: &NodeTemplate<T, C>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        initial_vars: VarMap,
        options: RuntimeOptions,
    ) -> Self {
        let (root_key, nodes) = NodeCell::flatten(template);
        let (finish_tx, finish_rx) = mpsc::unbounded_channel();
        Self {
            options,
            evaluator,
            vars: Arc::new(Mutex::new(initial_vars.clone())),
            initial_vars,
            queue: VecDeque::new(),
            history: Vec::new(),
            nodes,
            root_key,
            iteration_count: 0,
            errors: Vec::new(),
            finish_tx,
            finish_rx,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Resets the runtime for a fresh pass: all nodes back to `Init`,
    /// variables back to their initial values, queue, history, and errors
    /// cleared.
    ///
    /// The variable store and completion channel are replaced rather than
    /// cleared, so leaf tasks left over from an abandoned pass cannot leak
    /// writes or completions into the new one.
    pub fn initialize_state(&mut self) {
        for node in self.nodes.values_mut() {
            node.status = NodeStatus::Init;
        }
        self.vars = Arc::new(Mutex::new(self.initial_vars.clone()));
        self.queue.clear();
        self.history.clear();
        self.errors.clear();
        self.iteration_count = 0;
        let (finish_tx, finish_rx) = mpsc::unbounded_channel();
        self.finish_tx = finish_tx;
        self.finish_rx = finish_rx;
        self.in_flight = Arc::new(AtomicUsize::new(0));
    }

    pub fn get_var(&self, name: &str) -> Option<Value> {
        self.vars.lock().ok()?.get(name).cloned()
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        if let Ok(mut vars) = self.vars.lock() {
            vars.insert(name.into(), value);
        }
    }

    /// Shared handle to the variable store, for leaf tasks.
    pub fn vars_handle(&self) -> Arc<Mutex<VarMap>> {
        Arc::clone(&self.vars)
    }

    pub fn evaluator_handle(&self) -> Arc<dyn ExpressionEvaluator> {
        Arc::clone(&self.evaluator)
    }

    /// Evaluates an expression against a snapshot of the current variables.
    pub fn eval_expression(&self, expression: &str, node_key: &str) -> anyhow::Result<Value> {
        let snapshot = self
            .vars
            .lock()
            .map_err(|_| anyhow::anyhow!("variable store poisoned"))?
            .clone();
        self.evaluator.evaluate(expression, &snapshot, node_key)
    }

    /// Records an error without interrupting the pass.
    pub fn record_error(&mut self, node_key: impl Into<String>, error: impl ToString) {
        self.errors.push(ErrorRecord {
            node_key: node_key.into(),
            error: error.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn push_command(&mut self, command: Command) {
        debug!(kind = %command.kind, node = %command.node_key, "queueing command");
        self.queue.push_back(command);
    }

    /// Pops the next command, recording it in history when enabled.
    pub fn pop_command(&mut self) -> Option<Command> {
        let command = self.queue.pop_front()?;
        if self.options.enable_history {
            self.history.push(command.clone());
        }
        Some(command)
    }

    pub fn has_pending_commands(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn history(&self) -> &[Command] {
        &self.history
    }

    pub fn node(&self, key: &str) -> Result<&NodeCell<T, C>, TreeError> {
        self.nodes.get(key).ok_or_else(|| TreeError::NodeNotFound {
            key: key.to_string(),
        })
    }

    pub fn node_mut(&mut self, key: &str) -> Result<&mut NodeCell<T, C>, TreeError> {
        self.nodes.get_mut(key).ok_or_else(|| TreeError::NodeNotFound {
            key: key.to_string(),
        })
    }

    pub fn try_node(&self, key: &str) -> Option<&NodeCell<T, C>> {
        self.nodes.get(key)
    }

    pub fn set_status(&mut self, key: &str, status: NodeStatus) -> Result<(), TreeError> {
        let node = self.node_mut(key)?;
        debug!(node = %key, from = %node.status, to = %status, "status change");
        node.status = status;
        Ok(())
    }

    pub fn root_key(&self) -> &str {
        &self.root_key
    }

    pub fn root(&self) -> Result<&NodeCell<T, C>, TreeError> {
        self.node(&self.root_key)
    }

    /// The tree is complete once the queue is drained and the root has
    /// settled.
    pub fn is_complete(&self) -> bool {
        self.queue.is_empty()
            && self
                .nodes
                .get(&self.root_key)
                .is_some_and(|root| root.status.is_terminal())
    }

    /// The overall result. `Running` until the root settles.
    pub fn result(&self) -> BehaviorResult {
        match self.nodes.get(&self.root_key).map(|root| root.status) {
            Some(NodeStatus::Success) => BehaviorResult::Success,
            Some(NodeStatus::Failure) => BehaviorResult::Failure,
            _ => BehaviorResult::Running,
        }
    }

    pub fn bump_iteration(&mut self) -> u64 {
        self.iteration_count += 1;
        self.iteration_count
    }

    pub fn iteration_count(&self) -> u64 {
        self.iteration_count
    }

    /// Sender handed to leaf tasks for reporting completion.
    pub fn finish_sender(&self) -> UnboundedSender<Command> {
        self.finish_tx.clone()
    }

    /// Claims an in-flight slot for a leaf task about to be spawned.
    pub fn leaf_ticket(&self) -> LeafTicket {
        self.in_flight.fetch_add(1, Ordering::Acquire);
        LeafTicket {
            counter: Arc::clone(&self.in_flight),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Moves every already-delivered completion into the command queue
    /// without blocking.
    pub fn poll_completions(&mut self) {
        while let Ok(command) = self.finish_rx.try_recv() {
            self.queue.push_back(command);
        }
    }

    /// Waits for the next completion and queues it. Returns `false` if the
    /// channel is closed, which cannot happen while the runtime holds the
    /// sender.
    pub async fn recv_completion(&mut self) -> bool {
        match self.finish_rx.recv().await {
            Some(command) => {
                self.queue.push_back(command);
                true
            }
            None => false,
        }
    }
}
