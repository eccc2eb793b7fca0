//! Resolution configuration for exception policy handling
//!
//! This module provides the knobs that control how a thrown failure is matched
//! against registered policies: how far a cause chain is followed, whether
//! route scoped policies of other routes may be considered, and whether a
//! default strategy is installed at all.

use std::num::NonZeroUsize;

/// Configuration for exception policy resolution
///
/// By default a strategy is installed, route scoped policies stay inside their
/// route, cause chains are followed to their root, and a misbehaving guard
/// counts as not matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ResolverConfig {
    /// Optional bound on the number of errors visited in a cause chain (default: `None`)
    ///
    /// Cyclic chains always stop at the first repeated error, so the bound is
    /// only needed to cap the cost of pathological but acyclic chains. With a
    /// bound set, causes beyond it are never matched.
    pub max_cause_depth: Option<NonZeroUsize>,

    /// Exclude route scoped policies registered for a route other than the current one
    pub isolate_routes: bool,

    /// Install `DefaultExceptionPolicyStrategy` when an error handler is created
    ///
    /// If disabled, a strategy must be supplied before the first resolution
    pub install_default_strategy: bool,

    /// Treat a panicking guard as evaluating to `false` instead of unwinding
    pub catch_guard_panics: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_cause_depth: None,
            isolate_routes: true,
            install_default_strategy: true,
            catch_guard_panics: true,
        }
    }
}

impl ResolverConfig {
    /// Creates a strict configuration
    ///
    /// No strategy is installed implicitly, one must be set before the first
    /// resolution.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            install_default_strategy: false,
            ..Self::default()
        }
    }

    /// Creates a permissive configuration
    ///
    /// Route scoped policies of other routes remain eligible (they only lose the
    /// route tie-break).
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            isolate_routes: false,
            ..Self::default()
        }
    }

    /// Returns a copy with a different cause chain bound
    ///
    /// ## Arguments
    /// * 'depth' - Maximum number of errors visited, `0` removes the bound
    #[must_use]
    pub fn with_max_cause_depth(mut self, depth: usize) -> Self {
        self.max_cause_depth = NonZeroUsize::new(depth);
        self
    }
}
