//! Resolution strategies selecting the policy that handles a failure.
//!
//! # Default Algorithm
//!
//! [`DefaultExceptionPolicyStrategy`] walks the cause chain of the thrown
//! failure from the outermost failure to the root cause. For every failure it
//!
//! 1. collects all entries whose exception type is the failure's type or one of
//!    its ancestors, keeping only those with the smallest inheritance distance;
//! 2. orders the remaining ties: entries scoped to the current route first, then
//!    guarded entries before unguarded ones, then declaration order;
//! 3. returns the first entry in that order whose guard holds (an entry without
//!    a guard always holds).
//!
//! If every tie at a level is rejected by its guard, or nothing matches at all,
//! the walk moves on to the next cause. Only an exhausted chain yields `None`.
//!
//! Guards are evaluated lazily during step 3 and never for entries ordered
//! behind the winner.

use std::sync::Arc;

use crate::{
    policy::{guard, PolicyDefinitionRc, PolicyKey},
    Exchange, ExceptionPolicies, Failure, ResolverConfig,
};

/// Selects the policy to handle a failure.
///
/// The default implementation is [`DefaultExceptionPolicyStrategy`]; custom
/// implementations can change precedence rules wholesale. Implementations must
/// not mutate anything and must complete in bounded time.
pub trait ExceptionPolicyStrategy: Send + Sync {
    /// Resolve the best policy for `failure`
    ///
    /// ## Arguments
    /// * 'policies' - Snapshot of the registered policies
    /// * 'exchange' - The exchange whose processing failed
    /// * 'failure'  - The thrown failure
    ///
    /// Returns `None` if no policy applies, which is a normal outcome.
    fn get_exception_policy(
        &self,
        policies: &ExceptionPolicies,
        exchange: &Exchange,
        failure: &Failure,
    ) -> Option<PolicyDefinitionRc>;
}

impl<T: ExceptionPolicyStrategy + ?Sized> ExceptionPolicyStrategy for Arc<T> {
    fn get_exception_policy(
        &self,
        policies: &ExceptionPolicies,
        exchange: &Exchange,
        failure: &Failure,
    ) -> Option<PolicyDefinitionRc> {
        (**self).get_exception_policy(policies, exchange, failure)
    }
}

/// An entry that matched a failure at the minimal distance
struct Candidate<'a> {
    /// Position in the registry, i.e. declaration order
    order: usize,
    key: &'a PolicyKey,
    definition: PolicyDefinitionRc,
}

/// The default resolution strategy, hierarchy distance with route, guard and
/// declaration order tie-breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExceptionPolicyStrategy {
    config: ResolverConfig,
}

impl DefaultExceptionPolicyStrategy {
    /// Create a new strategy with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new strategy with a custom configuration
    pub fn with_config(config: ResolverConfig) -> Self {
        DefaultExceptionPolicyStrategy { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Collect the entries matching `failure` at the smallest inheritance distance
    fn candidates<'a>(
        &self,
        policies: &'a ExceptionPolicies,
        current_route: Option<&str>,
        failure: &Failure,
    ) -> Vec<Candidate<'a>> {
        let mut best = usize::MAX;
        let mut found = Vec::new();

        for (order, (key, definition_ref)) in policies.iter().enumerate() {
            if self.config.isolate_routes {
                if let (Some(own), Some(current)) = (key.route_id(), current_route) {
                    if own != current {
                        continue;
                    }
                }
            }

            let Some(distance) = key.exception_type().distance_to(failure.exception_type())
            else {
                continue;
            };
            if distance > best {
                continue;
            }

            let Some(definition) = definition_ref.upgrade() else {
                tracing::warn!(
                    exception_type = %key.exception_type(),
                    route = key.route_id(),
                    "skipping exception policy whose definition has been dropped"
                );
                continue;
            };

            if distance < best {
                best = distance;
                found.clear();
            }

            tracing::trace!(
                policy = definition.id(),
                exception_type = %key.exception_type(),
                distance,
                "exception policy candidate"
            );
            found.push(Candidate {
                order,
                key,
                definition,
            });
        }

        found
    }

    /// Pick the winner among equally distant candidates, `None` if all guards reject
    fn select(
        &self,
        mut candidates: Vec<Candidate<'_>>,
        exchange: &Exchange,
        current_route: Option<&str>,
    ) -> Option<PolicyDefinitionRc> {
        if candidates.len() > 1 {
            candidates.sort_by_key(|candidate| {
                (
                    !candidate.key.is_scoped_to(current_route),
                    candidate.key.guard().is_none(),
                    candidate.order,
                )
            });
        }

        candidates
            .into_iter()
            .find(|candidate| match candidate.key.guard() {
                None => true,
                Some(predicate) => {
                    let matched = guard::evaluate(
                        predicate.as_ref(),
                        exchange,
                        self.config.catch_guard_panics,
                    );
                    if !matched {
                        tracing::trace!(
                            policy = candidate.definition.id(),
                            "exception policy rejected by its guard"
                        );
                    }
                    matched
                }
            })
            .map(|candidate| candidate.definition)
    }
}

impl ExceptionPolicyStrategy for DefaultExceptionPolicyStrategy {
    fn get_exception_policy(
        &self,
        policies: &ExceptionPolicies,
        exchange: &Exchange,
        failure: &Failure,
    ) -> Option<PolicyDefinitionRc> {
        let current_route = exchange.route_id();

        for (level, cause) in failure
            .cause_chain(self.config.max_cause_depth)
            .enumerate()
        {
            let candidates = self.candidates(policies, current_route, cause);
            if candidates.is_empty() {
                tracing::trace!(level, failure = %cause, "no exception policy candidates");
                continue;
            }

            if let Some(definition) = self.select(candidates, exchange, current_route) {
                tracing::debug!(
                    exchange = exchange.id(),
                    policy = definition.id(),
                    level,
                    failure = %cause,
                    "resolved exception policy"
                );
                return Some(definition);
            }
        }

        tracing::debug!(
            exchange = exchange.id(),
            failure = %failure,
            "no exception policy found"
        );
        None
    }
}
