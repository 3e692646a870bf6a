//! Dispatch requests and path routing contexts.

use std::any::Any;
use std::sync::Arc;

use crate::config::{Payload, StrategyKind};
use crate::matcher::PathMatchResult;
use crate::route::RouteValue;

/// Context handed to path strategy handlers.
#[derive(Clone)]
pub struct PathContext {
    /// Opaque runtime shared by every handler invocation.
    pub runtime: Payload,
    /// The request being routed.
    pub request: Payload,
    /// The path string to match against registered patterns.
    pub path: String,
}

/// Context handed to path+action rules.
#[derive(Clone)]
pub struct ActionPathContext {
    pub runtime: Payload,
    pub request: Payload,
    /// Action to filter on, absent when the caller routes by path alone.
    pub action: Option<RouteValue>,
    pub path: String,
    /// Populated by the engine once a rule's pattern has matched.
    pub path_match: Option<PathMatchResult>,
}

/// A request to the dispatch engine, one variant per strategy.
pub enum DispatchRequest {
    Class {
        input: Option<Payload>,
    },
    RouteKey {
        key: String,
        input: Payload,
        apply_defaults: bool,
    },
    Enum {
        value: RouteValue,
        input: Payload,
    },
    RouteKeyToEnum {
        key: String,
        input: Payload,
    },
    Command {
        command: String,
        input: Payload,
    },
    Path(PathContext),
    ActionPath(ActionPathContext),
}

impl DispatchRequest {
    /// The strategy this request resolves against.
    pub fn kind(&self) -> StrategyKind {
        match self {
            DispatchRequest::Class { .. } => StrategyKind::Class,
            DispatchRequest::RouteKey { .. } => StrategyKind::RouteKey,
            DispatchRequest::Enum { .. } => StrategyKind::Enum,
            DispatchRequest::RouteKeyToEnum { .. } => StrategyKind::RouteKeyToEnum,
            DispatchRequest::Command { .. } => StrategyKind::CommandTable,
            DispatchRequest::Path(_) => StrategyKind::Path,
            DispatchRequest::ActionPath(_) => StrategyKind::ActionPath,
        }
    }

    /// Routes by the concrete type of `input`.
    pub fn class_of<T: Any + Send + Sync>(input: T) -> Self {
        DispatchRequest::Class {
            input: Some(Arc::new(input)),
        }
    }

    /// Routes an absent payload; resolves against the handler registered for
    /// the unit type.
    pub fn class_null() -> Self {
        DispatchRequest::Class { input: None }
    }

    /// Routes by string key. `apply_defaults` controls whether the default
    /// key and default input handlers are consulted on a miss.
    pub fn route_key(
        key: impl Into<String>,
        input: impl Any + Send + Sync,
        apply_defaults: bool,
    ) -> Self {
        DispatchRequest::RouteKey {
            key: key.into(),
            input: Arc::new(input),
            apply_defaults,
        }
    }

    /// Routes by enum value.
    pub fn enum_route(value: impl Into<RouteValue>, input: impl Any + Send + Sync) -> Self {
        DispatchRequest::Enum {
            value: value.into(),
            input: Arc::new(input),
        }
    }

    /// Routes by string key converted through the registered converter chain.
    pub fn route_key_to_enum(key: impl Into<String>, input: impl Any + Send + Sync) -> Self {
        DispatchRequest::RouteKeyToEnum {
            key: key.into(),
            input: Arc::new(input),
        }
    }

    /// Routes a command string through the command table.
    pub fn command(command: impl Into<String>, input: impl Any + Send + Sync) -> Self {
        DispatchRequest::Command {
            command: command.into(),
            input: Arc::new(input),
        }
    }

    /// Routes by path.
    pub fn path(runtime: Payload, request: Payload, path: impl Into<String>) -> Self {
        DispatchRequest::Path(PathContext {
            runtime,
            request,
            path: path.into(),
        })
    }

    /// Routes by path and optional action.
    pub fn action_path(
        runtime: Payload,
        request: Payload,
        path: impl Into<String>,
        action: Option<RouteValue>,
    ) -> Self {
        DispatchRequest::ActionPath(ActionPathContext {
            runtime,
            request,
            action,
            path: path.into(),
            path_match: None,
        })
    }
}
