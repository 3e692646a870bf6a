//! Node-kind to logic resolution via the dispatch engine.

use std::sync::Arc;

use dispatch_engine::{
    DispatchEngine, DispatchOutcome, DispatchRequest, EnumConfig, RouteValue, StrategyConfig,
};

use crate::action::ActionHandlerRegistry;
use crate::error::TreeError;
use crate::logic::{
    ActionLogic, ConditionLogic, NodeLogic, SelectorLogic, SequenceLogic, UntilLogic,
};
use crate::node::{NodeConfig, NodeKind, NodeType};

/// Resolves a node kind to its logic through an enum-keyed dispatch table.
///
/// Logic objects need mutable access to the runtime, which cannot ride
/// through an opaque dispatch payload. The table therefore resolves to the
/// logic object itself; the caller invokes it.
pub struct NodeKindDispatcher<T, C> {
    engine: DispatchEngine<Arc<dyn NodeLogic<T, C>>>,
}

impl<T: NodeType, C: NodeConfig> NodeKindDispatcher<T, C> {
    /// Builds the standard five-kind table.
    pub fn new(registry: Arc<ActionHandlerRegistry<T, C>>) -> Self {
        let sequence: Arc<dyn NodeLogic<T, C>> = Arc::new(SequenceLogic);
        let selector: Arc<dyn NodeLogic<T, C>> = Arc::new(SelectorLogic);
        let condition: Arc<dyn NodeLogic<T, C>> = Arc::new(ConditionLogic);
        let action: Arc<dyn NodeLogic<T, C>> = Arc::new(ActionLogic::new(registry));
        let until: Arc<dyn NodeLogic<T, C>> = Arc::new(UntilLogic);

        let config = EnumConfig::new()
            .on(NodeKind::Sequence.as_ref(), move |_| {
                let logic = Arc::clone(&sequence);
                async move { logic }
            })
            .on(NodeKind::Selector.as_ref(), move |_| {
                let logic = Arc::clone(&selector);
                async move { logic }
            })
            .on(NodeKind::Condition.as_ref(), move |_| {
                let logic = Arc::clone(&condition);
                async move { logic }
            })
            .on(NodeKind::Action.as_ref(), move |_| {
                let logic = Arc::clone(&action);
                async move { logic }
            })
            .on(NodeKind::Until.as_ref(), move |_| {
                let logic = Arc::clone(&until);
                async move { logic }
            });

        let mut engine = DispatchEngine::new();
        engine.register_strategy(StrategyConfig::Enum(config));
        Self { engine }
    }

    /// Looks up the logic for a node kind.
    pub async fn resolve(&self, kind: NodeKind) -> Result<Arc<dyn NodeLogic<T, C>>, TreeError> {
        let request = DispatchRequest::enum_route(RouteValue::from(kind.as_ref()), ());
        match self.engine.dispatch(request).await {
            DispatchOutcome::Handled(logic) => Ok(logic),
            DispatchOutcome::NotHandled => Err(TreeError::UnhandledKind { kind }),
        }
    }
}
