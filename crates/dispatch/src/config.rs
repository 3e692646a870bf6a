//! Strategy configurations and handler signatures.
//!
//! Each strategy is configured through a dedicated builder struct and sealed
//! into the [`StrategyConfig`] enum before registration. Handlers are async:
//! they take an opaque [`Payload`] and return a boxed future.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::matcher::PathMatcher;
use crate::request::{ActionPathContext, PathContext};
use crate::route::RouteValue;
use crate::rule::PathActionRule;

/// Opaque payload carried through the engine.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Boxed future returned by every handler.
pub type HandlerFuture<R> = Pin<Box<dyn Future<Output = R> + Send>>;

/// Handler invoked with the routed input alone.
pub type InputHandler<R> = Arc<dyn Fn(Payload) -> HandlerFuture<R> + Send + Sync>;

/// Fallback handler that also receives the unresolved route key.
pub type KeyedHandler<R> = Arc<dyn Fn(String, Payload) -> HandlerFuture<R> + Send + Sync>;

/// Fallback handler that receives the unresolved enum value.
pub type EnumFallbackHandler<R> = Arc<dyn Fn(RouteValue, Payload) -> HandlerFuture<R> + Send + Sync>;

/// Handler for a path strategy entry; `None` passes to the next handler.
pub type PathHandler<R> =
    Arc<dyn Fn(PathContext) -> HandlerFuture<Option<R>> + Send + Sync>;

/// Handler bound to a path+action rule.
pub type RuleHandler<R> = Arc<dyn Fn(ActionPathContext) -> HandlerFuture<R> + Send + Sync>;

/// Converts a raw string key into a route value, `None` on no mapping.
pub type KeyConverter = Arc<dyn Fn(&str) -> Option<RouteValue> + Send + Sync>;

/// Looks up a handler for a converted route value.
pub type HandlerExtractor<R> =
    Arc<dyn Fn(&RouteValue) -> Option<InputHandler<R>> + Send + Sync>;

/// The seven routing strategies.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum StrategyKind {
    Class,
    RouteKey,
    Enum,
    RouteKeyToEnum,
    CommandTable,
    Path,
    ActionPath,
}

/// A fully built strategy configuration, ready for registration.
pub enum StrategyConfig<R> {
    Class(ClassConfig<R>),
    RouteKey(RouteKeyConfig<R>),
    Enum(EnumConfig<R>),
    RouteKeyToEnum(RouteKeyToEnumConfig<R>),
    CommandTable(CommandTableConfig<R>),
    Path(PathConfig<R>),
    ActionPath(ActionPathConfig<R>),
}

impl<R> StrategyConfig<R> {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyConfig::Class(_) => StrategyKind::Class,
            StrategyConfig::RouteKey(_) => StrategyKind::RouteKey,
            StrategyConfig::Enum(_) => StrategyKind::Enum,
            StrategyConfig::RouteKeyToEnum(_) => StrategyKind::RouteKeyToEnum,
            StrategyConfig::CommandTable(_) => StrategyKind::CommandTable,
            StrategyConfig::Path(_) => StrategyKind::Path,
            StrategyConfig::ActionPath(_) => StrategyKind::ActionPath,
        }
    }
}

fn box_handler<R, F, Fut>(f: F) -> InputHandler<R>
where
    R: Send + 'static,
    F: Fn(Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    Arc::new(move |payload| Box::pin(f(payload)) as HandlerFuture<R>)
}

/// Routing by the concrete type of the payload.
///
/// Keys are [`TypeId`]s; an absent payload routes to the handler registered
/// for the unit type `()`.
pub struct ClassConfig<R> {
    pub(crate) handlers: HashMap<TypeId, InputHandler<R>>,
    pub(crate) default_handler: Option<InputHandler<R>>,
}

impl<R: Send + 'static> ClassConfig<R> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            default_handler: None,
        }
    }

    /// Registers a handler for payloads of type `T`. Re-registering the same
    /// type replaces the previous handler.
    pub fn on<T, F, Fut>(mut self, handler: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.handlers.insert(TypeId::of::<T>(), box_handler(handler));
        self
    }

    /// Registers the fallback for unregistered payload types.
    pub fn default_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.default_handler = Some(box_handler(handler));
        self
    }
}

impl<R: Send + 'static> Default for ClassConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Routing by exact string key.
pub struct RouteKeyConfig<R> {
    pub(crate) handlers: HashMap<String, InputHandler<R>>,
    pub(crate) default_key_handler: Option<KeyedHandler<R>>,
    pub(crate) default_input_handler: Option<InputHandler<R>>,
}

impl<R: Send + 'static> RouteKeyConfig<R> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            default_key_handler: None,
            default_input_handler: None,
        }
    }

    pub fn on<F, Fut>(mut self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.handlers.insert(key.into(), box_handler(handler));
        self
    }

    /// Fallback that receives the unresolved key; consulted before the
    /// input-only fallback.
    pub fn default_key<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(String, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.default_key_handler =
            Some(Arc::new(move |key, payload| Box::pin(handler(key, payload)) as HandlerFuture<R>));
        self
    }

    /// Fallback that receives the input alone.
    pub fn default_input<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.default_input_handler = Some(box_handler(handler));
        self
    }
}

impl<R: Send + 'static> Default for RouteKeyConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Routing by enum value.
pub struct EnumConfig<R> {
    pub(crate) handlers: HashMap<RouteValue, InputHandler<R>>,
    pub(crate) default_enum_handler: Option<EnumFallbackHandler<R>>,
    pub(crate) default_input_handler: Option<InputHandler<R>>,
}

impl<R: Send + 'static> EnumConfig<R> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            default_enum_handler: None,
            default_input_handler: None,
        }
    }

    pub fn on<F, Fut>(mut self, value: impl Into<RouteValue>, handler: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.handlers.insert(value.into(), box_handler(handler));
        self
    }

    /// Fallback that receives the unresolved enum value; consulted before
    /// the input-only fallback.
    pub fn default_enum<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(RouteValue, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.default_enum_handler = Some(Arc::new(move |value, payload| {
            Box::pin(handler(value, payload)) as HandlerFuture<R>
        }));
        self
    }

    pub fn default_input<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.default_input_handler = Some(box_handler(handler));
        self
    }
}

impl<R: Send + 'static> Default for EnumConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Routing by string key passed through an ordered chain of converters.
///
/// Converters are tried in registration order. A converter that maps the key
/// to a value whose handler is registered wins; otherwise the chain moves on,
/// even when the conversion itself succeeded.
pub struct RouteKeyToEnumConfig<R> {
    pub(crate) converters: Vec<(String, KeyConverter)>,
    pub(crate) handlers: HashMap<RouteValue, InputHandler<R>>,
}

impl<R: Send + 'static> RouteKeyToEnumConfig<R> {
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Appends a named converter to the chain.
    pub fn converter<F>(mut self, name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&str) -> Option<RouteValue> + Send + Sync + 'static,
    {
        self.converters.push((name.into(), Arc::new(convert)));
        self
    }

    pub fn on<F, Fut>(mut self, value: impl Into<RouteValue>, handler: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.handlers.insert(value.into(), box_handler(handler));
        self
    }
}

impl<R: Send + 'static> Default for RouteKeyToEnumConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Routing by command string through a converter plus handler table.
///
/// The table itself lives behind the extractor, so callers can back it with
/// any storage they like.
pub struct CommandTableConfig<R> {
    pub(crate) converter: Option<KeyConverter>,
    pub(crate) extractor: Option<HandlerExtractor<R>>,
    pub(crate) default_handler: Option<KeyedHandler<R>>,
}

impl<R: Send + 'static> CommandTableConfig<R> {
    pub fn new() -> Self {
        Self {
            converter: None,
            extractor: None,
            default_handler: None,
        }
    }

    /// Maps a raw command string to a table key.
    pub fn converter<F>(mut self, convert: F) -> Self
    where
        F: Fn(&str) -> Option<RouteValue> + Send + Sync + 'static,
    {
        self.converter = Some(Arc::new(convert));
        self
    }

    /// Looks up the handler for a converted key.
    pub fn extractor<F>(mut self, extract: F) -> Self
    where
        F: Fn(&RouteValue) -> Option<InputHandler<R>> + Send + Sync + 'static,
    {
        self.extractor = Some(Arc::new(extract));
        self
    }

    /// Fallback invoked with the original command string when conversion or
    /// extraction comes up empty.
    pub fn default_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(String, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.default_handler = Some(Arc::new(move |command, payload| {
            Box::pin(handler(command, payload)) as HandlerFuture<R>
        }));
        self
    }
}

impl<R: Send + 'static> Default for CommandTableConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Routing by path through an ordered handler list. The first handler to
/// return `Some` wins.
pub struct PathConfig<R> {
    pub(crate) handlers: Vec<PathHandler<R>>,
}

impl<R: Send + 'static> PathConfig<R> {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(PathContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<R>> + Send + 'static,
    {
        self.handlers
            .push(Arc::new(move |ctx| Box::pin(handler(ctx)) as HandlerFuture<Option<R>>));
        self
    }
}

impl<R: Send + 'static> Default for PathConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Routing by path and action through an ordered rule list. Rules are tried
/// in registration order; the first full match wins.
pub struct ActionPathConfig<R> {
    pub(crate) matcher: PathMatcher,
    pub(crate) rules: Vec<Arc<PathActionRule<R>>>,
}

impl<R: Send + 'static> ActionPathConfig<R> {
    pub fn new() -> Self {
        Self {
            matcher: PathMatcher::new(),
            rules: Vec::new(),
        }
    }

    pub fn matcher(mut self, matcher: PathMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn rule(mut self, rule: PathActionRule<R>) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn shared_rule(mut self, rule: Arc<PathActionRule<R>>) -> Self {
        self.rules.push(rule);
        self
    }
}

impl<R: Send + 'static> Default for ActionPathConfig<R> {
    fn default() -> Self {
        Self::new()
    }
}
