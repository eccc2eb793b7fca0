//! Name-indexed registry of exception types.
//!
//! The `ExceptionTypeRegistry` is the universe policies are declared against.
//! It starts out with the [`BuiltinKind`] hierarchy and lets applications add
//! their own types beneath it. Lookups and definitions are safe to perform
//! concurrently from multiple threads.
//!
//! # Examples
//!
//! ```rust
//! use policyscope::types::{ExceptionTypeRegistry, TypeResolver};
//!
//! let types = ExceptionTypeRegistry::new();
//! let declined = types.define("PaymentDeclined", Some("IllegalStateException"))?;
//!
//! assert_eq!(declined.depth(), 4);
//! assert!(types.resolve("PaymentDeclined").is_some());
//! # Ok::<(), policyscope::Error>(())
//! ```

use dashmap::{mapref::entry::Entry, DashMap};
use strum::IntoEnumIterator;

use crate::{
    types::{BuiltinKind, ExceptionType, ExceptionTypeRc, TypeResolver},
    Error::{TypeInsert, TypeMissingParent, TypeNotFound},
    Result,
};

/// Central registry for all exception types known to an application.
///
/// # Thread Safety
///
/// Backed by a `DashMap`, so lookups never block each other and definitions
/// of distinct names proceed in parallel. Defining the same name twice with
/// the same parent is idempotent and returns the existing handle.
pub struct ExceptionTypeRegistry {
    /// Types indexed by their full name
    types: DashMap<String, ExceptionTypeRc>,
}

impl ExceptionTypeRegistry {
    /// Create a new registry with all builtin types registered.
    pub fn new() -> Self {
        let registry = Self::empty();
        for kind in BuiltinKind::iter() {
            let new_type = match kind.parent().and_then(|parent| registry.get(parent.name())) {
                Some(base) => ExceptionType::extending(kind.name(), &base),
                None => ExceptionType::root(kind.name()),
            };
            registry.types.insert(kind.name().to_string(), new_type);
        }

        registry
    }

    /// Create a new registry without any types, not even the builtins.
    pub fn empty() -> Self {
        ExceptionTypeRegistry {
            types: DashMap::new(),
        }
    }

    /// Get a type by name
    ///
    /// ## Arguments
    /// * 'name' - The full type name to look for
    pub fn get(&self, name: &str) -> Option<ExceptionTypeRc> {
        self.types.get(name).map(|entry| entry.value().clone())
    }

    /// Get a builtin type
    ///
    /// ## Arguments
    /// * 'kind' - The builtin to look for
    ///
    /// # Errors
    /// Returns an error if the registry was created with [`ExceptionTypeRegistry::empty`]
    /// and the builtin was never defined.
    pub fn get_builtin(&self, kind: BuiltinKind) -> Result<ExceptionTypeRc> {
        self.get(kind.name())
            .ok_or_else(|| TypeNotFound(kind.name().to_string()))
    }

    /// Define a new type, optionally extending an existing one.
    ///
    /// ## Arguments
    /// * 'name'   - The full name of the new type
    /// * 'parent' - Name of the parent type, `None` to define a new root
    ///
    /// # Errors
    /// - [`crate::Error::TypeMissingParent`] if `parent` is not registered
    /// - [`crate::Error::TypeInsert`] if `name` is registered with a different parent
    pub fn define(&self, name: &str, parent: Option<&str>) -> Result<ExceptionTypeRc> {
        let base = match parent {
            Some(parent_name) => Some(
                self.get(parent_name)
                    .ok_or_else(|| TypeMissingParent(parent_name.to_string()))?,
            ),
            None => None,
        };

        match self.types.entry(name.to_string()) {
            Entry::Occupied(existing) => {
                let existing = existing.get();
                let same_base = match (existing.base(), &base) {
                    (None, None) => true,
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                };

                if same_base {
                    Ok(existing.clone())
                } else {
                    Err(TypeInsert(name.to_string()))
                }
            }
            Entry::Vacant(slot) => {
                let new_type = match &base {
                    Some(base) => ExceptionType::extending(name, base),
                    None => ExceptionType::root(name),
                };
                Ok(slot.insert(new_type).value().clone())
            }
        }
    }

    /// Count of types in the registry
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Get all types in the registry, in no particular order
    pub fn all_types(&self) -> Vec<ExceptionTypeRc> {
        self.types
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl Default for ExceptionTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeResolver for ExceptionTypeRegistry {
    fn resolve(&self, name: &str) -> Option<ExceptionTypeRc> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use strum::EnumCount;

    use super::*;
    use crate::Error;

    #[test]
    fn test_registry_builtins() {
        let registry = ExceptionTypeRegistry::new();
        assert_eq!(registry.len(), BuiltinKind::COUNT);

        let throwable = registry.get_builtin(BuiltinKind::Throwable).unwrap();
        let runtime = registry.get_builtin(BuiltinKind::RuntimeException).unwrap();
        let npe = registry.get_builtin(BuiltinKind::NullPointerException).unwrap();

        assert!(throwable.base().is_none());
        assert_eq!(npe.base().unwrap().name, "RuntimeException");
        assert_eq!(runtime.distance_to(&npe), Some(1));
        assert_eq!(throwable.distance_to(&npe), Some(3));

        for kind in BuiltinKind::iter() {
            assert!(registry.get_builtin(kind).is_ok(), "Failed to get builtin: {kind:?}");
        }
    }

    #[test]
    fn test_define_and_lookup() {
        let registry = ExceptionTypeRegistry::new();

        let declined = registry
            .define("PaymentDeclined", Some("IllegalStateException"))
            .unwrap();
        assert_eq!(declined.name, "PaymentDeclined");
        assert_eq!(registry.get("PaymentDeclined").unwrap(), declined);

        let again = registry
            .define("PaymentDeclined", Some("IllegalStateException"))
            .unwrap();
        assert!(std::sync::Arc::ptr_eq(&declined, &again));
    }

    #[test]
    fn test_define_conflict() {
        let registry = ExceptionTypeRegistry::new();
        registry.define("Glitch", Some("IOException")).unwrap();

        let result = registry.define("Glitch", Some("RuntimeException"));
        assert!(matches!(result, Err(Error::TypeInsert(name)) if name == "Glitch"));

        let result = registry.define("Glitch", None);
        assert!(matches!(result, Err(Error::TypeInsert(_))));
    }

    #[test]
    fn test_define_missing_parent() {
        let registry = ExceptionTypeRegistry::new();
        let result = registry.define("Orphan", Some("NoSuchParent"));
        assert!(matches!(result, Err(Error::TypeMissingParent(name)) if name == "NoSuchParent"));
        assert!(registry.get("Orphan").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ExceptionTypeRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.get_builtin(BuiltinKind::Exception).is_err());
        assert!(matches!(
            registry.resolve_mandatory("Exception"),
            Err(Error::TypeNotFound(_))
        ));

        registry.define("Root", None).unwrap();
        assert_eq!(registry.all_types().len(), 1);
    }
}
