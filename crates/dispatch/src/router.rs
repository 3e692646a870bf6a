//! Typed routing facades over the path+action strategy.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use crate::config::{
    ActionPathConfig, HandlerFuture, Payload, RuleHandler, StrategyConfig,
};
use crate::engine::DispatchEngine;
use crate::matcher::{PathMatchResult, PathMatcher};
use crate::request::DispatchRequest;
use crate::route::RouteValue;
use crate::rule::{ActionMatchMode, DispatchError, PathActionRule};

/// A statically describable route: pattern, action filter, handler.
///
/// Useful for building route tables as plain data and registering them in
/// one pass.
pub struct PathActionRoute<Rt, Req, Resp> {
    pattern: String,
    mode: ActionMatchMode,
    actions: Option<HashSet<RouteValue>>,
    #[allow(clippy::type_complexity)]
    handler: Arc<
        dyn Fn(Arc<Rt>, Arc<Req>, Option<PathMatchResult>) -> HandlerFuture<Resp> + Send + Sync,
    >,
}

impl<Rt, Req, Resp> PathActionRoute<Rt, Req, Resp>
where
    Resp: Send + 'static,
{
    /// A route matching every action.
    pub fn all<F, Fut>(pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<Rt>, Arc<Req>, Option<PathMatchResult>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
    {
        Self {
            pattern: pattern.into(),
            mode: ActionMatchMode::All,
            actions: None,
            handler: Arc::new(move |rt, req, m| Box::pin(handler(rt, req, m)) as HandlerFuture<Resp>),
        }
    }

    /// A route accepting only the listed actions.
    pub fn in_actions<F, Fut>(
        pattern: impl Into<String>,
        actions: impl IntoIterator<Item = RouteValue>,
        handler: F,
    ) -> Self
    where
        F: Fn(Arc<Rt>, Arc<Req>, Option<PathMatchResult>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
    {
        Self {
            pattern: pattern.into(),
            mode: ActionMatchMode::In,
            actions: Some(actions.into_iter().collect()),
            handler: Arc::new(move |rt, req, m| Box::pin(handler(rt, req, m)) as HandlerFuture<Resp>),
        }
    }

    /// A route rejecting the listed actions.
    pub fn not_in_actions<F, Fut>(
        pattern: impl Into<String>,
        actions: impl IntoIterator<Item = RouteValue>,
        handler: F,
    ) -> Self
    where
        F: Fn(Arc<Rt>, Arc<Req>, Option<PathMatchResult>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
    {
        Self {
            pattern: pattern.into(),
            mode: ActionMatchMode::NotIn,
            actions: Some(actions.into_iter().collect()),
            handler: Arc::new(move |rt, req, m| Box::pin(handler(rt, req, m)) as HandlerFuture<Resp>),
        }
    }
}

/// Routes typed requests by path and optional action.
///
/// Wraps a [`DispatchEngine`] configured with the path+action strategy and
/// recovers the concrete runtime and request types on the way into each
/// handler.
pub struct PathActionRouter<Rt, Req, Resp> {
    path_extractor: Arc<dyn Fn(&Req) -> String + Send + Sync>,
    matcher: PathMatcher,
    rules: Vec<Arc<PathActionRule<Resp>>>,
    engine: DispatchEngine<Resp>,
    _runtime: std::marker::PhantomData<fn() -> Rt>,
}

impl<Rt, Req, Resp> PathActionRouter<Rt, Req, Resp>
where
    Rt: Send + Sync + 'static,
    Req: Send + Sync + 'static,
    Resp: Send + 'static,
{
    /// Creates a router that derives the match path from each request with
    /// `path_extractor`.
    pub fn new<F>(path_extractor: F) -> Self
    where
        F: Fn(&Req) -> String + Send + Sync + 'static,
    {
        Self::with_matcher(path_extractor, PathMatcher::new())
    }

    pub fn with_matcher<F>(path_extractor: F, matcher: PathMatcher) -> Self
    where
        F: Fn(&Req) -> String + Send + Sync + 'static,
    {
        Self {
            path_extractor: Arc::new(path_extractor),
            matcher,
            rules: Vec::new(),
            engine: DispatchEngine::new(),
            _runtime: std::marker::PhantomData,
        }
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registers a rule. Rules match in registration order.
    pub fn register<F, Fut>(
        &mut self,
        pattern: impl Into<String>,
        mode: ActionMatchMode,
        actions: Option<HashSet<RouteValue>>,
        handler: F,
    ) -> Result<&mut Self, DispatchError>
    where
        F: Fn(Arc<Rt>, Arc<Req>, Option<PathMatchResult>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
    {
        let wrapped = Arc::new(move |rt, req, m| Box::pin(handler(rt, req, m)) as HandlerFuture<Resp>);
        self.register_wrapped(pattern.into(), mode, actions, wrapped)
    }

    /// Registers every route in a table, in order.
    pub fn register_routes(
        &mut self,
        routes: impl IntoIterator<Item = PathActionRoute<Rt, Req, Resp>>,
    ) -> Result<&mut Self, DispatchError> {
        for route in routes {
            self.register_route(route)?;
        }
        Ok(self)
    }

    pub fn register_route(
        &mut self,
        route: PathActionRoute<Rt, Req, Resp>,
    ) -> Result<&mut Self, DispatchError> {
        self.register_wrapped(route.pattern, route.mode, route.actions, route.handler)
    }

    /// Registers a rule accepting every action.
    pub fn register_all<F, Fut>(
        &mut self,
        pattern: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, DispatchError>
    where
        F: Fn(Arc<Rt>, Arc<Req>, Option<PathMatchResult>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
    {
        self.register(pattern, ActionMatchMode::All, None, handler)
    }

    /// Registers a rule accepting only the listed actions.
    pub fn register_in<F, Fut>(
        &mut self,
        pattern: impl Into<String>,
        actions: impl IntoIterator<Item = RouteValue>,
        handler: F,
    ) -> Result<&mut Self, DispatchError>
    where
        F: Fn(Arc<Rt>, Arc<Req>, Option<PathMatchResult>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
    {
        self.register(
            pattern,
            ActionMatchMode::In,
            Some(actions.into_iter().collect()),
            handler,
        )
    }

    /// Registers a rule rejecting the listed actions.
    pub fn register_not_in<F, Fut>(
        &mut self,
        pattern: impl Into<String>,
        actions: impl IntoIterator<Item = RouteValue>,
        handler: F,
    ) -> Result<&mut Self, DispatchError>
    where
        F: Fn(Arc<Rt>, Arc<Req>, Option<PathMatchResult>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
    {
        self.register(
            pattern,
            ActionMatchMode::NotIn,
            Some(actions.into_iter().collect()),
            handler,
        )
    }

    #[allow(clippy::type_complexity)]
    fn register_wrapped(
        &mut self,
        pattern: String,
        mode: ActionMatchMode,
        actions: Option<HashSet<RouteValue>>,
        handler: Arc<
            dyn Fn(Arc<Rt>, Arc<Req>, Option<PathMatchResult>) -> HandlerFuture<Resp>
                + Send
                + Sync,
        >,
    ) -> Result<&mut Self, DispatchError> {
        let rule_handler: RuleHandler<Resp> = Arc::new(move |ctx| {
            // dispatch() is the only producer of these payloads, so the
            // downcasts cannot fail.
            let runtime = ctx
                .runtime
                .downcast::<Rt>()
                .expect("runtime payload type is fixed by dispatch()");
            let request = ctx
                .request
                .downcast::<Req>()
                .expect("request payload type is fixed by dispatch()");
            handler(runtime, request, ctx.path_match)
        });

        let rule = PathActionRule::new(pattern, mode, actions, rule_handler)?;
        self.rules.push(Arc::new(rule));
        self.rebuild_strategy();
        Ok(self)
    }

    fn rebuild_strategy(&mut self) {
        let mut config = ActionPathConfig::new().matcher(self.matcher.clone());
        for rule in &self.rules {
            config = config.shared_rule(Arc::clone(rule));
        }
        self.engine
            .register_strategy(StrategyConfig::ActionPath(config));
    }

    /// Routes a request. Returns `None` when no rule matches.
    pub async fn dispatch(
        &self,
        runtime: Arc<Rt>,
        request: Arc<Req>,
        action: Option<RouteValue>,
    ) -> Option<Resp> {
        let path = (self.path_extractor)(request.as_ref());
        let runtime: Payload = runtime;
        let request: Payload = request;
        let outcome = self
            .engine
            .dispatch(DispatchRequest::action_path(runtime, request, path, action))
            .await;
        outcome.into_option()
    }
}

/// Routes typed requests by path alone.
///
/// A thin wrapper over [`PathActionRouter`] that registers every rule in
/// `All` mode and dispatches without an action.
pub struct PathRouter<Rt, Req, Resp> {
    inner: PathActionRouter<Rt, Req, Resp>,
}

impl<Rt, Req, Resp> PathRouter<Rt, Req, Resp>
where
    Rt: Send + Sync + 'static,
    Req: Send + Sync + 'static,
    Resp: Send + 'static,
{
    pub fn new<F>(path_extractor: F) -> Self
    where
        F: Fn(&Req) -> String + Send + Sync + 'static,
    {
        Self {
            inner: PathActionRouter::new(path_extractor),
        }
    }

    pub fn with_matcher<F>(path_extractor: F, matcher: PathMatcher) -> Self
    where
        F: Fn(&Req) -> String + Send + Sync + 'static,
    {
        Self {
            inner: PathActionRouter::with_matcher(path_extractor, matcher),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn register<F, Fut>(
        &mut self,
        pattern: impl Into<String>,
        handler: F,
    ) -> Result<&mut Self, DispatchError>
    where
        F: Fn(Arc<Rt>, Arc<Req>, Option<PathMatchResult>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
    {
        self.inner.register_all(pattern, handler)?;
        Ok(self)
    }

    pub async fn dispatch(&self, runtime: Arc<Rt>, request: Arc<Req>) -> Option<Resp> {
        self.inner.dispatch(runtime, request, None).await
    }
}
