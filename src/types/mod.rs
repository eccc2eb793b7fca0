//! Exception type handles and the type hierarchy they live in.
//!
//! Policies match thrown failures by type. This module provides the resolved,
//! comparable handle for such a type, together with the inheritance queries the
//! resolution algorithm relies on.
//!
//! # Key Components
//!
//! - [`ExceptionType`]: A named exception type with an optional parent
//! - [`ExceptionTypeRegistry`]: Name-indexed universe of types, pre-populated with builtins
//! - [`BuiltinKind`]: The builtin exception types and their inheritance
//! - [`TypeResolver`]: Resolves declared type names to handles
//!
//! # Hierarchy Queries
//!
//! - [`ExceptionType::is_ancestor_of`]: reflexive and transitive "catches" relation
//! - [`ExceptionType::distance_to`]: number of inheritance steps, `0` for the type itself
//!
//! # Examples
//!
//! ```rust
//! use policyscope::types::{BuiltinKind, ExceptionTypeRegistry};
//!
//! let types = ExceptionTypeRegistry::new();
//! let exception = types.get_builtin(BuiltinKind::Exception)?;
//! let not_found = types.get_builtin(BuiltinKind::FileNotFoundException)?;
//!
//! assert!(exception.is_ancestor_of(&not_found));
//! assert_eq!(exception.distance_to(&not_found), Some(2));
//! # Ok::<(), policyscope::Error>(())
//! ```

mod builtin;
mod registry;
mod resolver;

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

pub use builtin::BuiltinKind;
pub use registry::ExceptionTypeRegistry;
pub use resolver::TypeResolver;

/// Reference to an `ExceptionType`
pub type ExceptionTypeRc = Arc<ExceptionType>;

/// A resolved exception type.
///
/// Identity is the type name: two handles with the same name are the same type.
/// A handle owns its parent, so the inheritance chain is always complete and
/// acyclic once the handle exists.
pub struct ExceptionType {
    /// Full type name, e.g. `IOException` or `billing.PaymentDeclined`
    pub name: String,
    /// The parent type, `None` for a hierarchy root
    base: Option<ExceptionTypeRc>,
}

impl ExceptionType {
    /// Create a new root type without a parent
    pub fn root(name: impl Into<String>) -> ExceptionTypeRc {
        Arc::new(ExceptionType {
            name: name.into(),
            base: None,
        })
    }

    /// Create a new type extending `base`
    pub fn extending(name: impl Into<String>, base: &ExceptionTypeRc) -> ExceptionTypeRc {
        Arc::new(ExceptionType {
            name: name.into(),
            base: Some(base.clone()),
        })
    }

    /// Access the parent of this type, if it has one
    pub fn base(&self) -> Option<&ExceptionTypeRc> {
        self.base.as_ref()
    }

    /// Iterate over this type followed by all of its ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &ExceptionType> {
        std::iter::successors(Some(self), |current| current.base.as_deref())
    }

    /// Number of ancestors above this type (`0` for a root)
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }

    /// Returns the inheritance distance from `descendant` up to this type.
    ///
    /// `Some(0)` if both are the same type, `Some(n)` if this type is reached
    /// after `n` parent steps from `descendant`, `None` if this type is not an
    /// ancestor of `descendant` at all.
    ///
    /// ## Arguments
    /// * 'descendant' - The concrete type of a thrown failure
    pub fn distance_to(&self, descendant: &ExceptionType) -> Option<usize> {
        descendant.ancestors().position(|ancestor| ancestor == self)
    }

    /// Returns true if this type is `other` or one of its ancestors
    ///
    /// ## Arguments
    /// * 'other' - The type to test against
    pub fn is_ancestor_of(&self, other: &ExceptionType) -> bool {
        self.distance_to(other).is_some()
    }
}

impl PartialEq for ExceptionType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ExceptionType {}

impl Hash for ExceptionType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionType")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|base| base.name.as_str()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (ExceptionTypeRc, ExceptionTypeRc, ExceptionTypeRc) {
        let throwable = ExceptionType::root("Throwable");
        let exception = ExceptionType::extending("Exception", &throwable);
        let io = ExceptionType::extending("IOException", &exception);
        (throwable, exception, io)
    }

    #[test]
    fn test_distance() {
        let (throwable, exception, io) = chain();

        assert_eq!(io.distance_to(&io), Some(0));
        assert_eq!(exception.distance_to(&io), Some(1));
        assert_eq!(throwable.distance_to(&io), Some(2));
        assert_eq!(io.distance_to(&exception), None);
    }

    #[test]
    fn test_is_ancestor_of() {
        let (throwable, exception, io) = chain();
        let other = ExceptionType::root("Unrelated");

        assert!(io.is_ancestor_of(&io));
        assert!(throwable.is_ancestor_of(&io));
        assert!(!io.is_ancestor_of(&exception));
        assert!(!other.is_ancestor_of(&io));
        assert!(!throwable.is_ancestor_of(&other));
    }

    #[test]
    fn test_depth_and_ancestors() {
        let (throwable, _, io) = chain();

        assert_eq!(throwable.depth(), 0);
        assert_eq!(io.depth(), 2);

        let names: Vec<&str> = io.ancestors().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["IOException", "Exception", "Throwable"]);
    }

    #[test]
    fn test_identity_by_name() {
        let a = ExceptionType::root("Timeout");
        let b = ExceptionType::root("Timeout");
        assert_eq!(*a, *b);
        assert_eq!(a.to_string(), "Timeout");
    }
}
