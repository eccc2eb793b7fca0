//! # policyscope Prelude
//!
//! This module provides convenient re-exports of the most commonly used types and traits
//! from the policyscope library. Import it with a glob to get started quickly:
//!
//! ```rust
//! use policyscope::prelude::*;
//! ```
//!
//! ## Included
//!
//! - Error handling: [`Error`], [`Result`]
//! - Configuration: [`ResolverConfig`]
//! - Types: [`ExceptionType`], [`ExceptionTypeRc`], [`ExceptionTypeRegistry`], [`BuiltinKind`], [`TypeResolver`]
//! - Runtime: [`Exchange`], [`RouteContext`], [`Failure`], [`FailureRc`]
//! - Policies: [`PolicyBuilder`], [`PolicyDefinition`], [`OutputStage`], [`Guard`], [`ErrorHandlerSupport`]
//! - Resolution: [`ExceptionPolicyStrategy`], [`DefaultExceptionPolicyStrategy`]

// ================================================================================================
// Core Error Handling
// ================================================================================================

/// The main error type for all policyscope operations
pub use crate::Error;

/// The result type used throughout policyscope
pub use crate::Result;

// ================================================================================================
// Configuration
// ================================================================================================

/// Resolution configuration
pub use crate::ResolverConfig;

// ================================================================================================
// Exception Types
// ================================================================================================

/// Exception type handles and registry
pub use crate::types::{
    BuiltinKind, ExceptionType, ExceptionTypeRc, ExceptionTypeRegistry, TypeResolver,
};

// ================================================================================================
// Runtime
// ================================================================================================

/// Exchanges, routes and thrown failures
pub use crate::{Exchange, Failure, FailureRc, RouteContext};

// ================================================================================================
// Policies
// ================================================================================================

/// Policy declaration and storage
pub use crate::policy::{
    ErrorHandlerSupport, ExceptionPolicies, Guard, GuardRc, OutputStage, PolicyBuilder,
    PolicyDefinition, PolicyDefinitionRc, PolicyKey, PolicyRegistry,
};

/// Resolution strategies
pub use crate::policy::{DefaultExceptionPolicyStrategy, ExceptionPolicyStrategy};
