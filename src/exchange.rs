//! Exchanges and the routes they travel through.
//!
//! An [`Exchange`] is the unit of work whose processing failed. Resolution only
//! needs two things from it: the route it is currently processed in, and a
//! read-only view of its state for guards to inspect.
//!
//! A [`RouteContext`] is the declaration-time counterpart: it names a route and
//! supplies the [`TypeResolver`] its policies are resolved against.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{policy::PolicyBuilder, types::TypeResolver};

/// A single unit of work flowing through a route.
#[derive(Debug, Clone, Default)]
pub struct Exchange {
    /// Unique id of this exchange
    id: String,
    /// Route that is currently processing the exchange
    route_id: Option<String>,
    /// Exchange state visible to guards
    properties: HashMap<String, String>,
}

impl Exchange {
    /// Create a new exchange that is not yet bound to a route
    ///
    /// ## Arguments
    /// * 'id' - Unique id of the exchange
    pub fn new(id: impl Into<String>) -> Self {
        Exchange {
            id: id.into(),
            route_id: None,
            properties: HashMap::new(),
        }
    }

    /// Bind the exchange to the route currently processing it
    #[must_use]
    pub fn with_route(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    /// Set a property, builder style
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// The exchange id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The route currently processing this exchange, if known
    pub fn route_id(&self) -> Option<&str> {
        self.route_id.as_deref()
    }

    /// Move the exchange into another route
    pub fn set_route(&mut self, route_id: impl Into<String>) {
        self.route_id = Some(route_id.into());
    }

    /// Get a property by name
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Set a property, returning the previous value
    pub fn set_property(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.properties.insert(name.into(), value.into())
    }
}

/// Declaration-time view of a route.
#[derive(Clone)]
pub struct RouteContext {
    route_id: String,
    resolver: Arc<dyn TypeResolver>,
}

impl RouteContext {
    /// Create a new route context
    ///
    /// ## Arguments
    /// * 'route_id' - Id of the route
    /// * 'resolver' - Resolves exception type names declared in this route
    pub fn new(route_id: impl Into<String>, resolver: Arc<dyn TypeResolver>) -> Self {
        RouteContext {
            route_id: route_id.into(),
            resolver,
        }
    }

    /// The route id
    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    /// The resolver used for exception type names of this route
    pub fn resolver(&self) -> &dyn TypeResolver {
        self.resolver.as_ref()
    }

    /// Start declaring a policy owned by this route
    ///
    /// ## Arguments
    /// * 'id' - Id of the policy
    pub fn policy(&self, id: impl Into<String>) -> PolicyBuilder {
        PolicyBuilder::new(id).route(self.route_id.clone())
    }
}

impl fmt::Debug for RouteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteContext")
            .field("route_id", &self.route_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExceptionTypeRegistry;

    #[test]
    fn test_exchange_properties() {
        let mut exchange = Exchange::new("ex-1")
            .with_route("orders")
            .with_property("tenant", "acme");

        assert_eq!(exchange.id(), "ex-1");
        assert_eq!(exchange.route_id(), Some("orders"));
        assert_eq!(exchange.property("tenant"), Some("acme"));
        assert_eq!(exchange.property("missing"), None);

        assert_eq!(
            exchange.set_property("tenant", "globex"),
            Some("acme".to_string())
        );
        exchange.set_route("billing");
        assert_eq!(exchange.route_id(), Some("billing"));
    }

    #[test]
    fn test_route_context() {
        let route = RouteContext::new("orders", Arc::new(ExceptionTypeRegistry::new()));
        assert_eq!(route.route_id(), "orders");
        assert!(route.resolver().resolve("IOException").is_some());
    }
}
