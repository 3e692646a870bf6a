//! Multi-strategy message dispatch engine.
//!
//! This crate routes an opaque request to a registered handler using one of
//! seven interchangeable routing strategies: by payload type, by string route
//! key, by enum value, by key-to-enum conversion, by command table, by glob
//! path pattern, and by path+action combination.
//!
//! # Architecture
//!
//! - [`DispatchEngine`]: holds one [`StrategyConfig`] per strategy kind and
//!   resolves [`DispatchRequest`]s against it
//! - [`PathMatcher`]: Ant-style glob matching (`?`, `*`, `**`, `{name}`)
//!   with capture extraction
//! - [`PathActionRule`]: glob pattern + action allow/deny filter
//! - [`PathRouter`] / [`PathActionRouter`]: typed routing facades built from
//!   the primitives above
//!
//! A routing miss is never an error: it is surfaced as
//! [`DispatchOutcome::NotHandled`], a first-class outcome.

pub mod config;
pub mod engine;
pub mod matcher;
pub mod outcome;
pub mod request;
pub mod route;
pub mod router;
pub mod rule;

pub use config::{
    ActionPathConfig, ClassConfig, CommandTableConfig, EnumConfig, HandlerFuture, InputHandler,
    PathConfig, Payload, RouteKeyConfig, RouteKeyToEnumConfig, StrategyConfig, StrategyKind,
};
pub use engine::DispatchEngine;
pub use matcher::{PathMatchResult, PathMatcher};
pub use outcome::DispatchOutcome;
pub use request::{ActionPathContext, DispatchRequest, PathContext};
pub use route::RouteValue;
pub use router::{PathActionRoute, PathActionRouter, PathRouter};
pub use rule::{ActionMatchMode, DispatchError, PathActionRule};
