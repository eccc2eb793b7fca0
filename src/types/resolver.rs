use crate::{types::ExceptionTypeRc, Error, Result};

/// Resolves declared exception type names to type handles.
///
/// Policy declarations name the types they catch. Before a policy is
/// registered, each name is turned into an [`ExceptionTypeRc`] through a
/// resolver, usually the [`super::ExceptionTypeRegistry`] of the application.
///
/// Implementations must be side-effect-free lookups.
pub trait TypeResolver: Send + Sync {
    /// Look up a type by name, `None` if it is unknown
    ///
    /// ## Arguments
    /// * 'name' - The full type name
    fn resolve(&self, name: &str) -> Option<ExceptionTypeRc>;

    /// Look up a type by name, failing if it is unknown
    ///
    /// ## Arguments
    /// * 'name' - The full type name
    ///
    /// # Errors
    /// Returns [`Error::TypeNotFound`] if the resolver does not know `name`.
    fn resolve_mandatory(&self, name: &str) -> Result<ExceptionTypeRc> {
        self.resolve(name)
            .ok_or_else(|| Error::TypeNotFound(name.to_string()))
    }
}

impl<T: TypeResolver + ?Sized> TypeResolver for std::sync::Arc<T> {
    fn resolve(&self, name: &str) -> Option<ExceptionTypeRc> {
        (**self).resolve(name)
    }
}
