//! Path+action match rules.

use std::collections::HashSet;

use thiserror::Error;

use crate::config::RuleHandler;
use crate::matcher::PathMatcher;
use crate::request::ActionPathContext;
use crate::route::RouteValue;

/// How a rule filters on the request's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ActionMatchMode {
    /// Accept any action, including none.
    All,
    /// Accept only actions present in the rule's set.
    In,
    /// Accept only actions absent from the rule's set.
    NotIn,
}

/// Errors raised while building dispatch configuration.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("path pattern must not be empty")]
    EmptyPattern,

    #[error("action set must not be empty for mode {mode}")]
    EmptyActionSet { mode: ActionMatchMode },
}

/// One glob pattern plus an action filter plus a handler.
pub struct PathActionRule<R> {
    pattern: String,
    mode: ActionMatchMode,
    actions: Option<HashSet<RouteValue>>,
    handler: RuleHandler<R>,
}

impl<R> PathActionRule<R> {
    /// Builds a rule.
    ///
    /// The pattern must be non-empty. `In` and `NotIn` require a non-empty
    /// action set; `All` discards any set it is given.
    pub fn new(
        pattern: impl Into<String>,
        mode: ActionMatchMode,
        actions: Option<HashSet<RouteValue>>,
        handler: RuleHandler<R>,
    ) -> Result<Self, DispatchError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(DispatchError::EmptyPattern);
        }
        let actions = match mode {
            ActionMatchMode::All => None,
            ActionMatchMode::In | ActionMatchMode::NotIn => {
                if actions.as_ref().is_none_or(HashSet::is_empty) {
                    return Err(DispatchError::EmptyActionSet { mode });
                }
                actions
            }
        };
        Ok(Self {
            pattern,
            mode,
            actions,
            handler,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn mode(&self) -> ActionMatchMode {
        self.mode
    }

    fn action_matches(&self, action: Option<&RouteValue>) -> bool {
        match self.mode {
            ActionMatchMode::All => true,
            ActionMatchMode::In => match action {
                Some(value) => self
                    .actions
                    .as_ref()
                    .is_some_and(|set| set.contains(value)),
                None => false,
            },
            ActionMatchMode::NotIn => match action {
                Some(value) => self
                    .actions
                    .as_ref()
                    .is_none_or(|set| !set.contains(value)),
                None => true,
            },
        }
    }

    /// Attempts the rule against a context: glob match first, then the
    /// action filter, then variable extraction, then the handler. Returns
    /// `None` as soon as any stage rejects.
    pub async fn try_handle(
        &self,
        matcher: &PathMatcher,
        ctx: &ActionPathContext,
    ) -> Option<R> {
        if !matcher.matches(&self.pattern, &ctx.path) {
            return None;
        }
        if !self.action_matches(ctx.action.as_ref()) {
            return None;
        }
        let path_match = matcher.match_and_extract(&self.pattern, &ctx.path)?;
        let mut ctx = ctx.clone();
        ctx.path_match = Some(path_match);
        Some((self.handler)(ctx).await)
    }
}
