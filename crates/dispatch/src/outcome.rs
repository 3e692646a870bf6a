//! Outcome returned by the dispatch engine.

/// The result of dispatching a request.
///
/// A routing miss is not an error. Requests that no strategy or handler
/// claims resolve to [`DispatchOutcome::NotHandled`]; callers decide whether
/// that is a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome<R> {
    /// A handler was selected and produced this result.
    Handled(R),
    /// No registered strategy or handler claimed the request.
    NotHandled,
}

impl<R> DispatchOutcome<R> {
    /// Returns `true` if the request was handled.
    #[inline]
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled(_))
    }

    /// Converts the outcome into an `Option`, discarding the miss case.
    #[inline]
    pub fn into_option(self) -> Option<R> {
        match self {
            DispatchOutcome::Handled(result) => Some(result),
            DispatchOutcome::NotHandled => None,
        }
    }

    /// Maps the handled result, leaving a miss untouched.
    pub fn map<U>(self, f: impl FnOnce(R) -> U) -> DispatchOutcome<U> {
        match self {
            DispatchOutcome::Handled(result) => DispatchOutcome::Handled(f(result)),
            DispatchOutcome::NotHandled => DispatchOutcome::NotHandled,
        }
    }
}

impl<R> From<Option<R>> for DispatchOutcome<R> {
    fn from(value: Option<R>) -> Self {
        match value {
            Some(result) => DispatchOutcome::Handled(result),
            None => DispatchOutcome::NotHandled,
        }
    }
}
