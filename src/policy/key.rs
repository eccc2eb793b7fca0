use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{policy::GuardRc, types::ExceptionTypeRc};

/// Identifies a registered policy entry.
///
/// Keys compare by value: same route scope, same exception type and the same
/// guard instance. Guards have no structural equality, so two separately
/// created guards are always different, while clones of one [`GuardRc`] are
/// the same guard.
#[derive(Clone)]
pub struct PolicyKey {
    route_id: Option<String>,
    exception_type: ExceptionTypeRc,
    guard: Option<GuardRc>,
}

impl PolicyKey {
    /// Create a new key
    ///
    /// ## Arguments
    /// * 'route_id'       - Route scope, `None` for a globally applicable policy
    /// * 'exception_type' - The caught exception type
    /// * 'guard'          - Optional guard predicate
    pub fn new(
        route_id: Option<String>,
        exception_type: ExceptionTypeRc,
        guard: Option<GuardRc>,
    ) -> Self {
        PolicyKey {
            route_id,
            exception_type,
            guard,
        }
    }

    /// The route scope of this key, `None` if globally applicable
    pub fn route_id(&self) -> Option<&str> {
        self.route_id.as_deref()
    }

    /// The caught exception type
    pub fn exception_type(&self) -> &ExceptionTypeRc {
        &self.exception_type
    }

    /// The guard, if any
    pub fn guard(&self) -> Option<&GuardRc> {
        self.guard.as_ref()
    }

    /// Returns true if this key is scoped to exactly `route_id`
    pub fn is_scoped_to(&self, route_id: Option<&str>) -> bool {
        matches!((self.route_id(), route_id), (Some(own), Some(current)) if own == current)
    }

    fn guard_addr(&self) -> Option<*const ()> {
        self.guard
            .as_ref()
            .map(|guard| Arc::as_ptr(guard).cast::<()>())
    }
}

impl PartialEq for PolicyKey {
    fn eq(&self, other: &Self) -> bool {
        self.route_id == other.route_id
            && self.exception_type == other.exception_type
            && self.guard_addr() == other.guard_addr()
    }
}

impl Eq for PolicyKey {}

impl Hash for PolicyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.route_id.hash(state);
        self.exception_type.hash(state);
        self.guard_addr().hash(state);
    }
}

impl fmt::Debug for PolicyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyKey")
            .field("route_id", &self.route_id)
            .field("exception_type", &self.exception_type.name)
            .field("guard", &self.guard_addr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{policy::guard::property_present, types::ExceptionType};

    #[test]
    fn test_key_equality() {
        let io = ExceptionType::root("IOException");
        let guard = property_present("retry");

        let a = PolicyKey::new(Some("orders".into()), io.clone(), Some(guard.clone()));
        let b = PolicyKey::new(Some("orders".into()), io.clone(), Some(guard));
        let c = PolicyKey::new(Some("orders".into()), io.clone(), Some(property_present("retry")));
        let d = PolicyKey::new(None, io.clone(), None);
        let e = PolicyKey::new(None, ExceptionType::root("IOException"), None);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(d, e);

        let set: HashSet<PolicyKey> = [a, b, c, d, e].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_is_scoped_to() {
        let io = ExceptionType::root("IOException");
        let scoped = PolicyKey::new(Some("orders".into()), io.clone(), None);
        let global = PolicyKey::new(None, io, None);

        assert!(scoped.is_scoped_to(Some("orders")));
        assert!(!scoped.is_scoped_to(Some("billing")));
        assert!(!scoped.is_scoped_to(None));
        assert!(!global.is_scoped_to(Some("orders")));
        assert!(!global.is_scoped_to(None));
    }
}
