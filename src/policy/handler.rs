//! Error handler support: policy registration and resolution entry point.

use std::{fmt, sync::Arc};

use dashmap::DashMap;

use crate::{
    policy::{
        DefaultExceptionPolicyStrategy, ExceptionPolicyStrategy, PolicyDefinitionRc,
        PolicyRegistry,
    },
    Error, Exchange, Failure, ResolverConfig, Result,
};

/// Owns the policies of an error handler and the strategy resolving them.
///
/// Policies are added while routes are set up. Afterwards
/// [`ErrorHandlerSupport::get_exception_policy`] may be called concurrently
/// for any number of in-flight exchanges.
///
/// # Ownership
///
/// The registry only holds weak references. Every definition passed to
/// [`ErrorHandlerSupport::add_exception_policy`] is kept alive here on behalf of
/// its declaring route, until [`ErrorHandlerSupport::remove_route_policies`]
/// tears that route down. Definitions declared outside a route live as long as
/// the handler.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use policyscope::prelude::*;
///
/// let types = Arc::new(ExceptionTypeRegistry::new());
/// let route = RouteContext::new("orders", types.clone());
///
/// let handler = ErrorHandlerSupport::new();
/// let policy = route
///     .policy("io")
///     .exception("IOException")
///     .output(OutputStage::new("retry"))
///     .build(route.resolver())?;
/// handler.add_exception_policy(&policy);
///
/// let failure = Failure::new(types.get_builtin(BuiltinKind::FileNotFoundException)?, "gone");
/// let exchange = Exchange::new("ex-1").with_route("orders");
/// let resolved = handler.get_exception_policy(&exchange, &failure)?;
/// assert_eq!(resolved.unwrap().output().id(), "retry");
/// # Ok::<(), policyscope::Error>(())
/// ```
pub struct ErrorHandlerSupport {
    policies: PolicyRegistry,
    /// Strong references to registered definitions, grouped by declaring route
    declared: DashMap<Option<String>, Vec<PolicyDefinitionRc>>,
    strategy: Option<Arc<dyn ExceptionPolicyStrategy>>,
    config: ResolverConfig,
}

impl ErrorHandlerSupport {
    /// Create a new error handler with the default configuration and strategy
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a new error handler with a custom configuration
    ///
    /// A default strategy using `config` is installed only if
    /// `config.install_default_strategy` is set.
    pub fn with_config(config: ResolverConfig) -> Self {
        let strategy = config
            .install_default_strategy
            .then(|| Self::create_default_exception_policy_strategy(config));

        ErrorHandlerSupport {
            policies: PolicyRegistry::new(),
            declared: DashMap::new(),
            strategy,
            config,
        }
    }

    /// Creates the default exception policy strategy
    pub fn create_default_exception_policy_strategy(
        config: ResolverConfig,
    ) -> Arc<dyn ExceptionPolicyStrategy> {
        Arc::new(DefaultExceptionPolicyStrategy::with_config(config))
    }

    /// Register a policy, one entry per exception type it catches.
    ///
    /// The handler keeps `definition` alive until its declaring route is
    /// removed, so a temporary can be passed. Returns the number of registered
    /// keys. A policy without exception types registers nothing.
    pub fn add_exception_policy(&self, definition: &PolicyDefinitionRc) -> usize {
        if definition.catches().is_empty() {
            tracing::debug!(
                policy = definition.id(),
                "exception policy declares no exception types, nothing registered"
            );
            return 0;
        }

        // Owned before publishing, readers never see an entry that is already dead
        {
            let mut owned = self
                .declared
                .entry(definition.route_id().map(str::to_string))
                .or_default();
            if !owned.iter().any(|known| Arc::ptr_eq(known, definition)) {
                owned.push(definition.clone());
            }
        }

        self.policies.add_policy(definition)
    }

    /// Tear down the policies declared by `route_id`.
    ///
    /// Releases the handler's references to them and removes their entries,
    /// together with any entry whose definition has already been dropped, in a
    /// single registry update. Returns the number of removed entries.
    ///
    /// ## Arguments
    /// * 'route_id' - The declaring route
    pub fn remove_route_policies(&self, route_id: &str) -> usize {
        let Some((_, removed)) = self.declared.remove(&Some(route_id.to_string())) else {
            return 0;
        };

        let count = self.policies.retain(|_, definition| {
            definition.is_valid() && !removed.iter().any(|gone| definition.ptr_eq(gone))
        });
        tracing::debug!(
            route = route_id,
            definitions = removed.len(),
            entries = count,
            "removed route exception policies"
        );
        count
    }

    /// Find the best policy to handle `failure` thrown while processing `exchange`.
    ///
    /// ## Arguments
    /// * 'exchange' - The exchange whose processing failed
    /// * 'failure'  - The thrown failure
    ///
    /// Returns `Ok(None)` if no policy applies.
    ///
    /// # Errors
    /// Returns [`Error::StrategyNotConfigured`] if no strategy has been set.
    pub fn get_exception_policy(
        &self,
        exchange: &Exchange,
        failure: &Failure,
    ) -> Result<Option<PolicyDefinitionRc>> {
        let Some(strategy) = &self.strategy else {
            return Err(Error::StrategyNotConfigured);
        };

        let policies = self.policies.snapshot();
        Ok(strategy.get_exception_policy(&policies, exchange, failure))
    }

    /// Sets the strategy used for resolving policies.
    ///
    /// `None` is ignored and keeps the current strategy.
    pub fn set_exception_policy(&mut self, strategy: Option<Arc<dyn ExceptionPolicyStrategy>>) {
        if let Some(strategy) = strategy {
            self.strategy = Some(strategy);
        }
    }

    /// Returns true if a strategy is set
    pub fn has_exception_policy(&self) -> bool {
        self.strategy.is_some()
    }

    /// The registered policies
    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// The configuration this handler was created with
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

impl Default for ErrorHandlerSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorHandlerSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandlerSupport")
            .field("policies", &self.policies.len())
            .field("routes", &self.declared.len())
            .field("strategy", &self.strategy.is_some())
            .field("config", &self.config)
            .finish()
    }
}
