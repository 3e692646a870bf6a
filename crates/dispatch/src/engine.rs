//! The dispatch engine.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::{ClassConfig, StrategyConfig, StrategyKind};
use crate::outcome::DispatchOutcome;
use crate::request::DispatchRequest;

/// Routes requests to handlers through registered strategies.
///
/// Holds at most one configuration per [`StrategyKind`]; registering a
/// strategy twice replaces the earlier configuration. A request whose
/// strategy is not registered resolves to [`DispatchOutcome::NotHandled`].
pub struct DispatchEngine<R> {
    strategies: HashMap<StrategyKind, StrategyConfig<R>>,
}

impl<R: Send + 'static> DispatchEngine<R> {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Registers a strategy configuration, replacing any existing one of the
    /// same kind.
    pub fn register_strategy(&mut self, config: StrategyConfig<R>) -> &mut Self {
        let kind = config.kind();
        if self.strategies.insert(kind, config).is_some() {
            debug!(strategy = %kind, "replacing strategy configuration");
        }
        self
    }

    /// Returns whether a strategy of the given kind is registered.
    pub fn has_strategy(&self, kind: StrategyKind) -> bool {
        self.strategies.contains_key(&kind)
    }

    /// Resolves a request against its strategy and runs the selected
    /// handler.
    pub async fn dispatch(&self, request: DispatchRequest) -> DispatchOutcome<R> {
        let Some(config) = self.strategies.get(&request.kind()) else {
            debug!(strategy = %request.kind(), "no strategy registered");
            return DispatchOutcome::NotHandled;
        };

        match (config, request) {
            (StrategyConfig::Class(config), DispatchRequest::Class { input }) => {
                self.dispatch_class(config, input).await
            }
            (
                StrategyConfig::RouteKey(config),
                DispatchRequest::RouteKey {
                    key,
                    input,
                    apply_defaults,
                },
            ) => {
                if let Some(handler) = config.handlers.get(&key) {
                    return DispatchOutcome::Handled(handler(input).await);
                }
                if !apply_defaults {
                    return DispatchOutcome::NotHandled;
                }
                if let Some(handler) = &config.default_key_handler {
                    return DispatchOutcome::Handled(handler(key, input).await);
                }
                if let Some(handler) = &config.default_input_handler {
                    return DispatchOutcome::Handled(handler(input).await);
                }
                DispatchOutcome::NotHandled
            }
            (StrategyConfig::Enum(config), DispatchRequest::Enum { value, input }) => {
                if let Some(handler) = config.handlers.get(&value) {
                    return DispatchOutcome::Handled(handler(input).await);
                }
                if let Some(handler) = &config.default_enum_handler {
                    return DispatchOutcome::Handled(handler(value, input).await);
                }
                if let Some(handler) = &config.default_input_handler {
                    return DispatchOutcome::Handled(handler(input).await);
                }
                DispatchOutcome::NotHandled
            }
            (
                StrategyConfig::RouteKeyToEnum(config),
                DispatchRequest::RouteKeyToEnum { key, input },
            ) => {
                // A converter only wins if the converted value also has a
                // handler; otherwise the chain keeps going.
                for (name, convert) in &config.converters {
                    let Some(value) = convert(&key) else {
                        continue;
                    };
                    let Some(handler) = config.handlers.get(&value) else {
                        debug!(converter = %name, value = %value, "converted value has no handler");
                        continue;
                    };
                    return DispatchOutcome::Handled(handler(input).await);
                }
                DispatchOutcome::NotHandled
            }
            (
                StrategyConfig::CommandTable(config),
                DispatchRequest::Command { command, input },
            ) => {
                let resolved = config
                    .converter
                    .as_ref()
                    .and_then(|convert| convert(&command))
                    .and_then(|value| {
                        config
                            .extractor
                            .as_ref()
                            .and_then(|extract| extract(&value))
                    });
                if let Some(handler) = resolved {
                    return DispatchOutcome::Handled(handler(input).await);
                }
                if let Some(handler) = &config.default_handler {
                    return DispatchOutcome::Handled(handler(command, input).await);
                }
                DispatchOutcome::NotHandled
            }
            (StrategyConfig::Path(config), DispatchRequest::Path(ctx)) => {
                for handler in &config.handlers {
                    if let Some(result) = handler(ctx.clone()).await {
                        return DispatchOutcome::Handled(result);
                    }
                }
                DispatchOutcome::NotHandled
            }
            (StrategyConfig::ActionPath(config), DispatchRequest::ActionPath(ctx)) => {
                for rule in &config.rules {
                    if let Some(result) = rule.try_handle(&config.matcher, &ctx).await {
                        return DispatchOutcome::Handled(result);
                    }
                }
                DispatchOutcome::NotHandled
            }
            // register_strategy keys by kind and kind() is total, so a
            // config/request variant mismatch cannot happen.
            _ => DispatchOutcome::NotHandled,
        }
    }

    async fn dispatch_class(
        &self,
        config: &ClassConfig<R>,
        input: Option<crate::config::Payload>,
    ) -> DispatchOutcome<R> {
        let (type_id, payload) = match input {
            Some(payload) => ((*payload).type_id(), payload),
            None => (
                TypeId::of::<()>(),
                Arc::new(()) as crate::config::Payload,
            ),
        };
        if let Some(handler) = config.handlers.get(&type_id) {
            return DispatchOutcome::Handled(handler(payload).await);
        }
        if let Some(handler) = &config.default_handler {
            return DispatchOutcome::Handled(handler(payload).await);
        }
        DispatchOutcome::NotHandled
    }
}

impl<R: Send + 'static> Default for DispatchEngine<R> {
    fn default() -> Self {
        Self::new()
    }
}
