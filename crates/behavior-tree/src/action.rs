//! Action handlers and their registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::evaluator::{ExpressionEvaluator, VarMap};
use crate::node::{NodeCell, NodeConfig, NodeType};
use crate::status::BehaviorResult;

/// Everything an action handler can reach while running.
///
/// The variable store is shared with the runtime, so writes made here are
/// visible to conditions evaluated later in the same pass.
pub struct ActionContext<T, C> {
    pub node: NodeCell<T, C>,
    vars: Arc<Mutex<VarMap>>,
    evaluator: Arc<dyn ExpressionEvaluator>,
}

impl<T, C> ActionContext<T, C> {
    pub fn new(
        node: NodeCell<T, C>,
        vars: Arc<Mutex<VarMap>>,
        evaluator: Arc<dyn ExpressionEvaluator>,
    ) -> Self {
        Self {
            node,
            vars,
            evaluator,
        }
    }

    pub fn get_var(&self, name: &str) -> Option<Value> {
        self.vars.lock().ok()?.get(name).cloned()
    }

    pub fn set_var(&self, name: impl Into<String>, value: Value) {
        if let Ok(mut vars) = self.vars.lock() {
            vars.insert(name.into(), value);
        }
    }

    /// Evaluates an expression against the current variables.
    pub fn eval_expression(&self, expression: &str) -> anyhow::Result<Value> {
        let snapshot = self
            .vars
            .lock()
            .map_err(|_| anyhow::anyhow!("variable store poisoned"))?
            .clone();
        self.evaluator.evaluate(expression, &snapshot, &self.node.key)
    }
}

/// Async work attached to action nodes of one node type.
#[async_trait]
pub trait ActionHandler<T, C>: Send + Sync {
    async fn execute(&self, ctx: ActionContext<T, C>) -> anyhow::Result<BehaviorResult>;
}

/// Maps node types to their handlers. Re-registering a type replaces the
/// previous handler.
pub struct ActionHandlerRegistry<T, C> {
    handlers: HashMap<T, Arc<dyn ActionHandler<T, C>>>,
}

impl<T: NodeType, C: NodeConfig> ActionHandlerRegistry<T, C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, node_type: T, handler: Arc<dyn ActionHandler<T, C>>) -> &mut Self {
        self.handlers.insert(node_type, handler);
        self
    }

    pub fn get(&self, node_type: &T) -> Option<Arc<dyn ActionHandler<T, C>>> {
        self.handlers.get(node_type).cloned()
    }

    pub fn contains(&self, node_type: &T) -> bool {
        self.handlers.contains_key(node_type)
    }
}

impl<T: NodeType, C: NodeConfig> Default for ActionHandlerRegistry<T, C> {
    fn default() -> Self {
        Self::new()
    }
}
