//! Policy registry for exception policy resolution.
//!
//! This module provides the two layers policies are stored in:
//!
//! - [`ExceptionPolicies`] - An immutable, insertion-ordered map from
//!   [`PolicyKey`] to [`PolicyDefinitionRef`]. This is what strategies scan.
//! - [`PolicyRegistry`] - Holder of the current `ExceptionPolicies` snapshot,
//!   replaced atomically on every registration.
//!
//! # Ordering
//!
//! Iteration always follows declaration order, which the resolution tie-break
//! depends on. Registering an identical key again replaces its definition but
//! keeps the position of the first registration.
//!
//! # Thread Safety
//!
//! Readers take a snapshot (`Arc<ExceptionPolicies>`) and scan it without any
//! locking. Writers clone the current snapshot, apply their change and publish
//! the result with a single atomic swap, so a reader observes either all keys of
//! a definition or none of them.
//!
//! # Examples
//!
//! ```rust
//! use policyscope::policy::{OutputStage, PolicyBuilder, PolicyRegistry};
//! use policyscope::types::ExceptionTypeRegistry;
//!
//! let types = ExceptionTypeRegistry::new();
//! let policy = PolicyBuilder::new("io")
//!     .exception("IOException")
//!     .exception("TimeoutException")
//!     .output(OutputStage::new("retry"))
//!     .build(&types)?;
//!
//! let registry = PolicyRegistry::new();
//! assert_eq!(registry.add_policy(&policy), 2);
//!
//! let snapshot = registry.snapshot();
//! for (key, _definition) in snapshot.iter() {
//!     println!("{:?}", key);
//! }
//! # Ok::<(), policyscope::Error>(())
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;

use crate::policy::{PolicyDefinitionRc, PolicyDefinitionRef, PolicyKey};

/// Insertion-ordered set of registered policies.
#[derive(Clone, Debug, Default)]
pub struct ExceptionPolicies {
    /// Registered entries in declaration order
    entries: IndexMap<PolicyKey, PolicyDefinitionRef>,
}

impl ExceptionPolicies {
    /// Create a new, empty policy set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single entry.
    ///
    /// Returns `true` if an entry for an identical key was replaced.
    ///
    /// ## Arguments
    /// * 'key'        - The registry key
    /// * 'definition' - The definition the key resolves to
    pub fn register(&mut self, key: PolicyKey, definition: &PolicyDefinitionRc) -> bool {
        tracing::debug!(
            policy = definition.id(),
            route = key.route_id(),
            exception_type = %key.exception_type(),
            guarded = key.guard().is_some(),
            "registering exception policy"
        );

        self.entries
            .insert(key, PolicyDefinitionRef::new(definition))
            .is_some()
    }

    /// Register one entry per exception type caught by `definition`.
    ///
    /// Returns the number of keys registered.
    ///
    /// ## Arguments
    /// * 'definition' - The policy to register
    pub fn add_policy(&mut self, definition: &PolicyDefinitionRc) -> usize {
        let keys = definition.keys();
        let count = keys.len();
        for key in keys {
            self.register(key, definition);
        }
        count
    }

    /// Keep only the entries for which `keep` returns true, preserving order.
    ///
    /// Returns the number of removed entries.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&PolicyKey, &PolicyDefinitionRef) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|key, definition| keep(key, definition));
        before - self.entries.len()
    }

    /// Look up the definition registered for exactly `key`
    pub fn get(&self, key: &PolicyKey) -> Option<PolicyDefinitionRc> {
        self.entries.get(key).and_then(PolicyDefinitionRef::upgrade)
    }

    /// Iterate over all entries in declaration order.
    ///
    /// The iterator is cheap to create and can be restarted any number of times.
    pub fn iter(&self) -> indexmap::map::Iter<'_, PolicyKey, PolicyDefinitionRef> {
        self.entries.iter()
    }

    /// Count of registered keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no policy is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ExceptionPolicies {
    type Item = (&'a PolicyKey, &'a PolicyDefinitionRef);
    type IntoIter = indexmap::map::Iter<'a, PolicyKey, PolicyDefinitionRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Copy-on-write holder of the current [`ExceptionPolicies`] snapshot.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    snap: ArcSwap<ExceptionPolicies>,
}

impl PolicyRegistry {
    /// Create a new, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry publishing `policies` as its first snapshot
    pub fn from_policies(policies: ExceptionPolicies) -> Self {
        PolicyRegistry {
            snap: ArcSwap::from_pointee(policies),
        }
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<ExceptionPolicies> {
        self.snap.load_full()
    }

    /// Register a single entry, see [`ExceptionPolicies::register`]
    pub fn register(&self, key: PolicyKey, definition: &PolicyDefinitionRc) -> bool {
        let mut replaced = false;
        self.snap.rcu(|current| {
            let mut next = ExceptionPolicies::clone(current);
            replaced = next.register(key.clone(), definition);
            next
        });
        replaced
    }

    /// Register all keys of `definition` in one atomic update
    ///
    /// Returns the number of keys registered.
    pub fn add_policy(&self, definition: &PolicyDefinitionRc) -> usize {
        let mut count = 0;
        self.snap.rcu(|current| {
            let mut next = ExceptionPolicies::clone(current);
            count = next.add_policy(definition);
            next
        });
        count
    }

    /// Remove all entries rejected by `keep` in one atomic update
    ///
    /// Returns the number of removed entries.
    pub fn retain<F>(&self, keep: F) -> usize
    where
        F: Fn(&PolicyKey, &PolicyDefinitionRef) -> bool,
    {
        let mut removed = 0;
        self.snap.rcu(|current| {
            let mut next = ExceptionPolicies::clone(current);
            removed = next.retain(&keep);
            next
        });
        removed
    }

    /// Replace the whole policy set, e.g. when a route is reconfigured
    pub fn replace(&self, policies: ExceptionPolicies) {
        self.snap.store(Arc::new(policies));
    }

    /// Count of registered keys in the current snapshot
    pub fn len(&self) -> usize {
        self.snap.load().len()
    }

    /// Check if the current snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.snap.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        policy::{OutputStage, PolicyBuilder},
        types::ExceptionTypeRegistry,
    };

    fn policy(types: &ExceptionTypeRegistry, id: &str, exceptions: &[&str]) -> PolicyDefinitionRc {
        let mut builder = PolicyBuilder::new(id).output(OutputStage::new(id));
        for exception in exceptions {
            builder = builder.exception(*exception);
        }
        builder.build(types).unwrap()
    }

    #[test]
    fn test_insertion_order() {
        let types = ExceptionTypeRegistry::new();
        let first = policy(&types, "first", &["IOException", "TimeoutException"]);
        let second = policy(&types, "second", &["Exception"]);

        let mut policies = ExceptionPolicies::new();
        assert_eq!(policies.add_policy(&first), 2);
        assert_eq!(policies.add_policy(&second), 1);

        let order: Vec<&str> = policies
            .iter()
            .map(|(key, _)| key.exception_type().name.as_str())
            .collect();
        assert_eq!(order, ["IOException", "TimeoutException", "Exception"]);

        // restartable
        assert_eq!(policies.iter().count(), 3);
        assert_eq!((&policies).into_iter().count(), 3);
    }

    #[test]
    fn test_duplicate_key_overwrites_in_place() {
        let types = ExceptionTypeRegistry::new();
        let first = policy(&types, "first", &["IOException"]);
        let middle = policy(&types, "middle", &["Exception"]);
        let last = policy(&types, "last", &["IOException"]);

        let mut policies = ExceptionPolicies::new();
        policies.add_policy(&first);
        policies.add_policy(&middle);
        assert!(policies.register(last.keys()[0].clone(), &last));

        assert_eq!(policies.len(), 2);
        let (key, definition) = policies.iter().next().unwrap();
        assert_eq!(key.exception_type().name, "IOException");
        assert!(definition.ptr_eq(&last));
        assert_eq!(policies.get(key).unwrap().id(), "last");
    }

    #[test]
    fn test_registry_snapshots_are_isolated() {
        let types = ExceptionTypeRegistry::new();
        let first = policy(&types, "first", &["IOException"]);
        let second = policy(&types, "second", &["Exception", "Throwable"]);

        let registry = PolicyRegistry::new();
        assert!(registry.is_empty());
        registry.add_policy(&first);

        let before = registry.snapshot();
        assert_eq!(registry.add_policy(&second), 2);

        assert_eq!(before.len(), 1);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.snapshot().len(), 3);
    }

    #[test]
    fn test_registry_register_and_replace() {
        let types = ExceptionTypeRegistry::new();
        let first = policy(&types, "first", &["IOException"]);
        let second = policy(&types, "second", &["IOException"]);

        let registry = PolicyRegistry::new();
        assert!(!registry.register(first.keys()[0].clone(), &first));
        assert!(registry.register(second.keys()[0].clone(), &second));
        assert_eq!(registry.len(), 1);

        registry.replace(ExceptionPolicies::new());
        assert!(registry.is_empty());

        let mut prepared = ExceptionPolicies::new();
        prepared.add_policy(&first);
        let registry = PolicyRegistry::from_policies(prepared);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_retain_keeps_order() {
        let types = ExceptionTypeRegistry::new();
        let first = policy(&types, "first", &["IOException"]);
        let second = policy(&types, "second", &["Exception", "Throwable"]);
        let third = policy(&types, "third", &["ArithmeticException"]);

        let registry = PolicyRegistry::new();
        registry.add_policy(&first);
        registry.add_policy(&second);
        registry.add_policy(&third);

        assert_eq!(registry.retain(|_, definition| !definition.ptr_eq(&second)), 2);

        let snapshot = registry.snapshot();
        let ids: Vec<String> = snapshot
            .iter()
            .filter_map(|(_, definition)| definition.upgrade())
            .map(|definition| definition.id().to_string())
            .collect();
        assert_eq!(ids, ["first", "third"]);
    }

    #[test]
    fn test_concurrent_add_policy() {
        let types = ExceptionTypeRegistry::new();
        let policies: Vec<PolicyDefinitionRc> = (0..8)
            .map(|i| {
                let name = format!("Custom{i}");
                types.define(&name, Some("Exception")).unwrap();
                policy(&types, &name, &[name.as_str()])
            })
            .collect();

        let registry = PolicyRegistry::new();
        std::thread::scope(|scope| {
            for definition in &policies {
                let registry = &registry;
                scope.spawn(move || registry.add_policy(definition));
            }
        });

        assert_eq!(registry.len(), 8);
    }
}
