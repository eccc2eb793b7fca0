//! Exception policies: declaration, registry and resolution.
//!
//! A policy maps one or more exception types, optionally restricted to a route
//! and qualified by a guard, to a recovery stage. When processing an exchange
//! fails, a strategy picks the single best policy for the thrown failure.
//!
//! # Key Components
//!
//! - [`PolicyDefinition`] / [`PolicyBuilder`]: A declared policy
//! - [`PolicyKey`]: Registry key, one per caught exception type
//! - [`PolicyRegistry`] / [`ExceptionPolicies`]: Insertion-ordered policy storage
//! - [`ExceptionPolicyStrategy`] / [`DefaultExceptionPolicyStrategy`]: Resolution
//! - [`ErrorHandlerSupport`]: Ties registry and strategy together
//! - [`Guard`]: Optional predicate over the exchange

mod definition;
pub(crate) mod guard;
mod handler;
mod key;
mod registry;
mod strategy;

pub use definition::{
    OutputStage, PolicyBuilder, PolicyDefinition, PolicyDefinitionRc, PolicyDefinitionRef,
};
pub use guard::{property_equals, property_present, Guard, GuardRc};
pub use handler::ErrorHandlerSupport;
pub use key::PolicyKey;
pub use registry::{ExceptionPolicies, PolicyRegistry};
pub use strategy::{DefaultExceptionPolicyStrategy, ExceptionPolicyStrategy};
