//! Result values for cache operations that never fail outright.
//!
//! Every [`ProductCache`](crate::ProductCache) operation yields a value even
//! when storage or the network misbehaves: an empty list, zero, `false` or
//! `None`. The [`Outcome`] carries that value together with the diagnostics
//! explaining why it may be degraded.

use crate::Error;

/// One failure observed while producing an [`Outcome`].
#[derive(Debug)]
pub struct Diagnostic {
    /// What was being attempted, e.g. `search_products` or a record id.
    pub context: String,
    pub error: Error,
}

/// A value plus the failures encountered while producing it.
#[derive(Debug)]
#[must_use]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Outcome<T> {
    /// A value produced without incident.
    pub fn ok(value: T) -> Self {
        Self { value, diagnostics: Vec::new() }
    }

    /// A sentinel value standing in for a failed operation.
    pub fn degraded(value: T, context: impl Into<String>, error: Error) -> Self {
        let mut outcome = Self::ok(value);
        outcome.push(context, error);
        outcome
    }

    /// Record a failure. Logged at warn level.
    pub fn push(&mut self, context: impl Into<String>, error: Error) {
        let context = context.into();
        tracing::warn!(context = %context, error = %error, "cache operation degraded");
        self.diagnostics.push(Diagnostic { context, error });
    }

    /// True when nothing went wrong.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// True when the store was unavailable for this operation.
    pub fn storage_unavailable(&self) -> bool {
        self.diagnostics.iter().any(|d| d.error.is_unavailable())
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
