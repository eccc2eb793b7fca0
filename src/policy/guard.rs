//! Guard predicates that further qualify a policy match.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use crate::{Exchange, Result};

/// Reference to a `Guard`
pub type GuardRc = Arc<dyn Guard>;

/// A side-effect-free condition evaluated against the current exchange.
///
/// Guards run inside policy resolution, concurrently for many exchanges, so
/// they must be fast, non-blocking and idempotent. Returning an error is
/// treated exactly like returning `false`.
///
/// Any `Fn(&Exchange) -> bool` closure is a guard.
pub trait Guard: Send + Sync {
    /// Evaluate the guard for `exchange`
    ///
    /// # Errors
    /// Returns an error if the condition cannot be decided for this exchange.
    fn matches(&self, exchange: &Exchange) -> Result<bool>;
}

impl<F> Guard for F
where
    F: Fn(&Exchange) -> bool + Send + Sync,
{
    fn matches(&self, exchange: &Exchange) -> Result<bool> {
        Ok(self(exchange))
    }
}

/// Guard that holds when a property has the given value
pub fn property_equals(name: impl Into<String>, value: impl Into<String>) -> GuardRc {
    let name = name.into();
    let value = value.into();
    Arc::new(move |exchange: &Exchange| exchange.property(&name) == Some(value.as_str()))
}

/// Guard that holds when a property is present, whatever its value
pub fn property_present(name: impl Into<String>) -> GuardRc {
    let name = name.into();
    Arc::new(move |exchange: &Exchange| exchange.property(&name).is_some())
}

/// Evaluate a guard, mapping every failure mode to `false`.
///
/// Errors are logged and count as not matching. Panics are caught when
/// `catch_panics` is set, otherwise they unwind into the caller.
pub(crate) fn evaluate(guard: &dyn Guard, exchange: &Exchange, catch_panics: bool) -> bool {
    let outcome = if catch_panics {
        match catch_unwind(AssertUnwindSafe(|| guard.matches(exchange))) {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(exchange = exchange.id(), "guard panicked, treating as false");
                return false;
            }
        }
    } else {
        guard.matches(exchange)
    };

    match outcome {
        Ok(matched) => matched,
        Err(error) => {
            tracing::warn!(
                exchange = exchange.id(),
                %error,
                "guard failed to evaluate, treating as false"
            );
            false
        }
    }
}
