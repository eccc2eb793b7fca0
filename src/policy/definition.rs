//! Policy definitions and their builder.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::{
    policy::{GuardRc, PolicyKey},
    types::{ExceptionTypeRc, TypeResolver},
    Exchange, Result,
};

/// Reference to a `PolicyDefinition`
pub type PolicyDefinitionRc = Arc<PolicyDefinition>;

/// Reference to the processing stage that performs recovery for a policy.
///
/// This crate never invokes the stage, it only hands the reference back to the
/// caller together with the resolved definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputStage(String);

impl OutputStage {
    /// Create a new stage reference
    pub fn new(id: impl Into<String>) -> Self {
        OutputStage(id.into())
    }

    /// Id of the referenced stage
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A declared error handling policy.
///
/// Definitions are immutable once built. They are owned by the route that
/// declared them, the policy registry only holds [`PolicyDefinitionRef`]s.
pub struct PolicyDefinition {
    /// Policy id, unique within the declaring route
    id: String,
    /// The route that declared this policy, if any
    route_id: Option<String>,
    /// Whether the policy only applies to exchanges of the declaring route
    route_scoped: bool,
    /// Exception types caught by the policy, in declaration order, without duplicates
    catches: Vec<ExceptionTypeRc>,
    /// Optional guard, shared by all keys of this policy
    guard: Option<GuardRc>,
    /// Recovery stage
    output: OutputStage,
}

impl PolicyDefinition {
    /// The policy id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The route that declared this policy
    pub fn route_id(&self) -> Option<&str> {
        self.route_id.as_deref()
    }

    /// Returns true if the policy is restricted to its declaring route
    pub fn is_route_scoped(&self) -> bool {
        self.route_scoped
    }

    /// The exception types this policy catches
    pub fn catches(&self) -> &[ExceptionTypeRc] {
        &self.catches
    }

    /// The guard predicate, if any
    pub fn guard(&self) -> Option<&GuardRc> {
        self.guard.as_ref()
    }

    /// The recovery stage
    pub fn output(&self) -> &OutputStage {
        &self.output
    }

    /// Decompose this definition into one registry key per caught type.
    ///
    /// The keys carry the declaring route id only if the policy is route
    /// scoped, and all of them share the policy's guard.
    pub fn keys(&self) -> Vec<PolicyKey> {
        let route_id = if self.route_scoped {
            self.route_id.clone()
        } else {
            None
        };

        self.catches
            .iter()
            .map(|exception_type| {
                PolicyKey::new(route_id.clone(), exception_type.clone(), self.guard.clone())
            })
            .collect()
    }
}

impl fmt::Debug for PolicyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyDefinition")
            .field("id", &self.id)
            .field("route_id", &self.route_id)
            .field("route_scoped", &self.route_scoped)
            .field(
                "catches",
                &self
                    .catches
                    .iter()
                    .map(|t| t.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("guard", &self.guard.is_some())
            .field("output", &self.output)
            .finish()
    }
}

/// Non-owning reference to a [`PolicyDefinition`], as stored in the registry.
#[derive(Clone)]
pub struct PolicyDefinitionRef {
    weak_ref: Weak<PolicyDefinition>,
}

impl PolicyDefinitionRef {
    /// Create a new `PolicyDefinitionRef` from a strong reference
    pub fn new(strong_ref: &PolicyDefinitionRc) -> Self {
        Self {
            weak_ref: Arc::downgrade(strong_ref),
        }
    }

    /// Get a strong reference to the definition, `None` if its route dropped it
    #[must_use]
    pub fn upgrade(&self) -> Option<PolicyDefinitionRc> {
        self.weak_ref.upgrade()
    }

    /// Check if the referenced definition is still alive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.weak_ref.strong_count() > 0
    }

    /// Returns true if both refer to the same definition
    pub fn ptr_eq(&self, other: &PolicyDefinitionRc) -> bool {
        std::ptr::eq(self.weak_ref.as_ptr(), Arc::as_ptr(other))
    }
}

impl From<&PolicyDefinitionRc> for PolicyDefinitionRef {
    fn from(strong_ref: &PolicyDefinitionRc) -> Self {
        Self::new(strong_ref)
    }
}

impl fmt::Debug for PolicyDefinitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(definition) => write!(f, "PolicyDefinitionRef({})", definition.id),
            None => f.write_str("PolicyDefinitionRef(<dropped>)"),
        }
    }
}

/// A caught exception type, as declared
enum CatchSpec {
    Named(String),
    Resolved(ExceptionTypeRc),
}

/// Builder for [`PolicyDefinition`]s.
///
/// Exception types can be given as names, which are resolved when the policy
/// is built, or as already resolved handles. Declaration order is preserved.
///
/// # Examples
///
/// ```rust
/// use policyscope::policy::{OutputStage, PolicyBuilder};
/// use policyscope::types::ExceptionTypeRegistry;
///
/// let types = ExceptionTypeRegistry::new();
/// let policy = PolicyBuilder::new("io-retry")
///     .route("orders")
///     .route_scoped(true)
///     .exception("IOException")
///     .exception("TimeoutException")
///     .output(OutputStage::new("retry-later"))
///     .build(&types)?;
///
/// assert_eq!(policy.catches().len(), 2);
/// assert_eq!(policy.keys()[0].route_id(), Some("orders"));
/// # Ok::<(), policyscope::Error>(())
/// ```
pub struct PolicyBuilder {
    id: String,
    route_id: Option<String>,
    route_scoped: bool,
    catches: Vec<CatchSpec>,
    guard: Option<GuardRc>,
    output: Option<OutputStage>,
}

impl PolicyBuilder {
    /// Start a new policy declaration
    ///
    /// ## Arguments
    /// * 'id' - Policy id
    pub fn new(id: impl Into<String>) -> Self {
        PolicyBuilder {
            id: id.into(),
            route_id: None,
            route_scoped: false,
            catches: Vec::new(),
            guard: None,
            output: None,
        }
    }

    /// Set the route declaring this policy
    #[must_use]
    pub fn route(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    /// Restrict the policy to exchanges of its declaring route
    #[must_use]
    pub fn route_scoped(mut self, route_scoped: bool) -> Self {
        self.route_scoped = route_scoped;
        self
    }

    /// Catch an exception type by name
    #[must_use]
    pub fn exception(mut self, name: impl Into<String>) -> Self {
        self.catches.push(CatchSpec::Named(name.into()));
        self
    }

    /// Catch an already resolved exception type
    #[must_use]
    pub fn catches(mut self, exception_type: &ExceptionTypeRc) -> Self {
        self.catches
            .push(CatchSpec::Resolved(exception_type.clone()));
        self
    }

    /// Only apply the policy when `guard` holds for the exchange
    #[must_use]
    pub fn on_when(mut self, guard: GuardRc) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Only apply the policy when the closure holds for the exchange
    #[must_use]
    pub fn on_when_fn<F>(self, guard: F) -> Self
    where
        F: Fn(&Exchange) -> bool + Send + Sync + 'static,
    {
        self.on_when(Arc::new(guard))
    }

    /// Set the recovery stage
    #[must_use]
    pub fn output(mut self, output: OutputStage) -> Self {
        self.output = Some(output);
        self
    }

    /// Resolve all declared names and build the definition
    ///
    /// ## Arguments
    /// * 'resolver' - Resolves exception type names given via [`PolicyBuilder::exception`]
    ///
    /// # Errors
    /// - [`crate::Error::TypeNotFound`] if a declared name cannot be resolved
    /// - [`crate::Error::Malformed`] if no output stage was set, or the policy is
    ///   route scoped without a declaring route
    pub fn build(self, resolver: &dyn TypeResolver) -> Result<PolicyDefinitionRc> {
        let Some(output) = self.output else {
            return Err(malformed_error!("Policy '{}' has no output stage", self.id));
        };

        if self.route_scoped && self.route_id.is_none() {
            return Err(malformed_error!(
                "Policy '{}' is route scoped but not declared in a route",
                self.id
            ));
        }

        let mut catches: Vec<ExceptionTypeRc> = Vec::with_capacity(self.catches.len());
        for catch in self.catches {
            let exception_type = match catch {
                CatchSpec::Named(name) => resolver.resolve_mandatory(&name)?,
                CatchSpec::Resolved(exception_type) => exception_type,
            };

            if !catches.contains(&exception_type) {
                catches.push(exception_type);
            }
        }

        Ok(Arc::new(PolicyDefinition {
            id: self.id,
            route_id: self.route_id,
            route_scoped: self.route_scoped,
            catches,
            guard: self.guard,
            output,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        types::{BuiltinKind, ExceptionTypeRegistry},
        Error,
    };

    #[test]
    fn test_build_resolves_names_in_order() {
        let types = ExceptionTypeRegistry::new();
        let npe = types.get_builtin(BuiltinKind::NullPointerException).unwrap();

        let policy = PolicyBuilder::new("p1")
            .exception("IOException")
            .catches(&npe)
            .exception("IOException")
            .output(OutputStage::new("dlq"))
            .build(&types)
            .unwrap();

        let names: Vec<&str> = policy.catches().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["IOException", "NullPointerException"]);
        assert_eq!(policy.output().id(), "dlq");
        assert!(!policy.is_route_scoped());
    }

    #[test]
    fn test_build_unknown_type() {
        let types = ExceptionTypeRegistry::new();
        let result = PolicyBuilder::new("p1")
            .exception("NoSuchException")
            .output(OutputStage::new("dlq"))
            .build(&types);

        assert!(matches!(result, Err(Error::TypeNotFound(name)) if name == "NoSuchException"));
    }

    #[test]
    fn test_build_requires_output() {
        let types = ExceptionTypeRegistry::new();
        let result = PolicyBuilder::new("p1").exception("IOException").build(&types);
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_route_scoped_requires_route() {
        let types = ExceptionTypeRegistry::new();
        let result = PolicyBuilder::new("p1")
            .route_scoped(true)
            .exception("IOException")
            .output(OutputStage::new("dlq"))
            .build(&types);
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_keys_share_scope_and_guard() {
        let types = ExceptionTypeRegistry::new();
        let scoped = PolicyBuilder::new("p1")
            .route("orders")
            .route_scoped(true)
            .exception("IOException")
            .exception("TimeoutException")
            .on_when_fn(|exchange| exchange.property("retry").is_some())
            .output(OutputStage::new("dlq"))
            .build(&types)
            .unwrap();

        let keys = scoped.keys();
        assert_eq!(keys.len(), 2);
        for key in &keys {
            assert_eq!(key.route_id(), Some("orders"));
            assert!(key.guard().is_some());
        }
        assert_eq!(keys[0].exception_type().name, "IOException");
        assert_eq!(keys[1].exception_type().name, "TimeoutException");
    }

    #[test]
    fn test_unscoped_keys_have_no_route() {
        let types = ExceptionTypeRegistry::new();
        let global = PolicyBuilder::new("p1")
            .route("orders")
            .exception("IOException")
            .output(OutputStage::new("dlq"))
            .build(&types)
            .unwrap();

        assert_eq!(global.route_id(), Some("orders"));
        assert_eq!(global.keys()[0].route_id(), None);
    }

    #[test]
    fn test_definition_ref() {
        let types = ExceptionTypeRegistry::new();
        let policy = PolicyBuilder::new("p1")
            .exception("IOException")
            .output(OutputStage::new("dlq"))
            .build(&types)
            .unwrap();

        let weak = PolicyDefinitionRef::new(&policy);
        assert!(weak.is_valid());
        assert!(weak.ptr_eq(&policy));
        assert_eq!(weak.upgrade().unwrap().id(), "p1");

        drop(policy);
        assert!(!weak.is_valid());
        assert!(weak.upgrade().is_none());
    }
}
