//! Thrown failures and their cause chains.
//!
//! A [`Failure`] is the error raised while an exchange was processed. It carries
//! its resolved [`ExceptionTypeRc`], a message and an optional underlying cause,
//! forming a cause chain from the outermost failure down to the root cause.
//!
//! Causes can be attached after construction, which makes it possible to build
//! a chain that refers back to itself. [`CauseChain`] guards against this by
//! stopping at the first failure it has already visited. An explicit depth
//! bound can be added on top.

use std::{
    collections::HashSet,
    fmt,
    num::NonZeroUsize,
    sync::{Arc, OnceLock},
};

use crate::{types::ExceptionTypeRc, Result};

/// Reference to a `Failure`
pub type FailureRc = Arc<Failure>;

/// A failure thrown while processing an exchange.
pub struct Failure {
    /// Runtime type of this failure
    exception_type: ExceptionTypeRc,
    /// Human readable description
    message: String,
    /// The failure that caused this one, set at most once
    cause: OnceLock<FailureRc>,
}

impl Failure {
    /// Create a new failure without a cause
    ///
    /// ## Arguments
    /// * 'exception_type' - The runtime type of the failure
    /// * 'message'        - Description of what went wrong
    pub fn new(exception_type: ExceptionTypeRc, message: impl Into<String>) -> Self {
        Failure {
            exception_type,
            message: message.into(),
            cause: OnceLock::new(),
        }
    }

    /// Create a new failure wrapping `cause`
    ///
    /// ## Arguments
    /// * 'exception_type' - The runtime type of the failure
    /// * 'message'        - Description of what went wrong
    /// * 'cause'          - The underlying failure
    pub fn with_cause(
        exception_type: ExceptionTypeRc,
        message: impl Into<String>,
        cause: FailureRc,
    ) -> Self {
        let failure = Failure::new(exception_type, message);
        failure.cause.set(cause).ok();
        failure
    }

    /// The runtime type of this failure
    pub fn exception_type(&self) -> &ExceptionTypeRc {
        &self.exception_type
    }

    /// The failure message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The direct cause of this failure, if any
    pub fn cause(&self) -> Option<&FailureRc> {
        self.cause.get()
    }

    /// Attach the cause of this failure
    ///
    /// ## Arguments
    /// * 'cause' - The underlying failure
    ///
    /// # Errors
    /// Returns an error if a cause has already been set.
    pub fn set_cause(&self, cause: FailureRc) -> Result<()> {
        self.cause
            .set(cause)
            .map_err(|_| malformed_error!("Cause of '{}' already set", self.exception_type))
    }

    /// Walk this failure and its causes, outermost first
    ///
    /// Without a bound the walk ends at the root cause or at the first repeated
    /// failure. With a bound it additionally stops after `max_depth` entries.
    ///
    /// ## Arguments
    /// * 'max_depth' - Maximum number of failures yielded, `None` for the whole chain
    pub fn cause_chain(&self, max_depth: Option<NonZeroUsize>) -> CauseChain<'_> {
        CauseChain {
            next: Some(self),
            visited: HashSet::new(),
            remaining: max_depth.map(NonZeroUsize::get),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.exception_type, self.message)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Causes are printed by name only, a full recursive print could loop
        f.debug_struct("Failure")
            .field("exception_type", &self.exception_type.name)
            .field("message", &self.message)
            .field(
                "cause",
                &self.cause().map(|cause| cause.exception_type.name.as_str()),
            )
            .finish()
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause()
            .map(|cause| cause.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Iterator over a failure and its causes, from outermost to root cause.
///
/// Terminates at the root cause, at the first failure seen before (identity,
/// not equality) or after the optional number of entries.
pub struct CauseChain<'a> {
    next: Option<&'a Failure>,
    visited: HashSet<*const Failure>,
    /// Entries left before the depth bound cuts the walk, `None` if unbounded
    remaining: Option<usize>,
}

impl<'a> Iterator for CauseChain<'a> {
    type Item = &'a Failure;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;

        if self.remaining == Some(0) {
            tracing::warn!(
                failure = %current,
                "cause chain exceeds depth limit, remaining causes are ignored"
            );
            return None;
        }

        if !self.visited.insert(current as *const Failure) {
            tracing::warn!(failure = %current, "cyclic cause chain detected, stopping walk");
            return None;
        }

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        self.next = current.cause().map(|cause| cause.as_ref());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExceptionType;

    fn named(name: &str) -> FailureRc {
        Arc::new(Failure::new(ExceptionType::root(name), name.to_lowercase()))
    }

    #[test]
    fn test_chain_order() {
        let root = named("Root");
        let middle = Arc::new(Failure::with_cause(
            ExceptionType::root("Middle"),
            "middle",
            root,
        ));
        let outer = Failure::with_cause(ExceptionType::root("Outer"), "outer", middle);

        let names: Vec<&str> = outer
            .cause_chain(None)
            .map(|f| f.exception_type().name.as_str())
            .collect();
        assert_eq!(names, ["Outer", "Middle", "Root"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let a = named("A");
        let b = named("B");
        a.set_cause(b.clone()).unwrap();
        b.set_cause(a.clone()).unwrap();

        let names: Vec<&str> = a
            .cause_chain(None)
            .map(|f| f.exception_type().name.as_str())
            .collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn test_self_cause_terminates() {
        let a = named("A");
        a.set_cause(a.clone()).unwrap();
        assert_eq!(a.cause_chain(None).count(), 1);
    }

    fn nested(levels: usize) -> FailureRc {
        let mut current = named("Level0");
        for level in 1..levels {
            current = Arc::new(Failure::with_cause(
                ExceptionType::root(format!("Level{level}")),
                "wrapped",
                current,
            ));
        }
        current
    }

    #[test]
    fn test_depth_bound() {
        let current = nested(10);

        assert_eq!(current.cause_chain(NonZeroUsize::new(64)).count(), 10);
        assert_eq!(current.cause_chain(NonZeroUsize::new(3)).count(), 3);
        assert_eq!(current.cause_chain(NonZeroUsize::new(1)).count(), 1);
    }

    #[test]
    fn test_unbounded_chain_reaches_root() {
        let current = nested(500);

        assert_eq!(current.cause_chain(None).count(), 500);
        let root = current.cause_chain(None).last().unwrap();
        assert_eq!(root.exception_type().name, "Level0");
    }

    #[test]
    fn test_set_cause_twice() {
        let a = named("A");
        a.set_cause(named("B")).unwrap();
        assert!(a.set_cause(named("C")).is_err());
        assert_eq!(a.cause().unwrap().exception_type().name, "B");
    }

    #[test]
    fn test_error_source() {
        use std::error::Error as _;

        let outer = Failure::with_cause(ExceptionType::root("Outer"), "outer", named("Inner"));
        assert_eq!(outer.to_string(), "Outer: outer");
        assert_eq!(outer.source().unwrap().to_string(), "Inner: inner");
    }
}
