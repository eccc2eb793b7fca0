// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # policyscope
//!
//! [![Crates.io](https://img.shields.io/crates/v/policyscope.svg)](https://crates.io/crates/policyscope)
//! [![Documentation](https://docs.rs/policyscope/badge.svg)](https://docs.rs/policyscope)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/policyscope/blob/main/LICENSE-APACHE)
//!
//! Exception policy resolution for message-routing pipelines. When processing an
//! exchange fails, `policyscope` picks the single registered policy that should
//! handle the failure: deterministically, over a type hierarchy, with route
//! scoping and optional guard predicates.
//!
//! ## Features
//!
//! - **🧬 Type hierarchy matching** - The most specific declared exception type wins
//! - **🔗 Cause chain walk** - Outer failures first, then their causes, cycle safe
//! - **🛣️ Route scoping** - Routes override global policies without redeclaring them
//! - **🛡️ Guards** - Conditional policies without near-duplicate type entries
//! - **⚡ Lock-free reads** - Snapshot registry, safe for concurrent resolution
//! - **🧩 Pluggable strategy** - Replace the precedence rules wholesale
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use policyscope::prelude::*;
//!
//! let types = Arc::new(ExceptionTypeRegistry::new());
//! let route = RouteContext::new("orders", types.clone());
//! let handler = ErrorHandlerSupport::new();
//!
//! // A global catch-all and a route specific IOException policy
//! let fallback = PolicyBuilder::new("fallback")
//!     .exception("Exception")
//!     .output(OutputStage::new("dead-letter"))
//!     .build(types.as_ref())?;
//! let io = route
//!     .policy("io-retry")
//!     .route_scoped(true)
//!     .exception("IOException")
//!     .output(OutputStage::new("retry"))
//!     .build(route.resolver())?;
//! handler.add_exception_policy(&fallback);
//! handler.add_exception_policy(&io);
//!
//! let failure = Failure::new(types.get_builtin(BuiltinKind::ConnectException)?, "refused");
//!
//! let in_orders = Exchange::new("ex-1").with_route("orders");
//! let policy = handler.get_exception_policy(&in_orders, &failure)?;
//! assert_eq!(policy.map(|p| p.output().id().to_string()), Some("retry".into()));
//!
//! let elsewhere = Exchange::new("ex-2").with_route("billing");
//! let policy = handler.get_exception_policy(&elsewhere, &failure)?;
//! assert_eq!(policy.map(|p| p.output().id().to_string()), Some("dead-letter".into()));
//! # Ok::<(), policyscope::Error>(())
//! ```
//!
//! ## Resolution Rules
//!
//! See [`policy::DefaultExceptionPolicyStrategy`] for the full algorithm. In short:
//! the outermost failure in the cause chain that has any matching policy decides;
//! among its matches the closest inheritance distance wins; remaining ties go to
//! the current route's scoped policy, then to a policy whose guard holds, then to
//! the first declared.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (registration and resolution at `debug`,
//! candidate scans at `trace`, faulty guards and truncated cause chains at `warn`)
//! and never installs a subscriber itself.

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use policyscope::prelude::*;
///
/// let types = ExceptionTypeRegistry::new();
/// let handler = ErrorHandlerSupport::new();
/// let failure = Failure::new(types.get_builtin(BuiltinKind::IOException)?, "gone");
/// assert!(handler.get_exception_policy(&Exchange::new("ex-1"), &failure)?.is_none());
/// # Ok::<(), policyscope::Error>(())
/// ```
pub mod prelude;

/// Resolution configuration
///
/// [`ResolverConfig`] controls cause chain depth, route isolation, default
/// strategy installation and guard panic handling.
pub mod config;

/// Exchanges and route contexts
pub mod exchange;

/// Thrown failures and cause chain traversal
pub mod failure;

/// Policy declaration, registry and resolution
///
/// # Key Types
///
/// - [`policy::PolicyBuilder`] - Declare a policy
/// - [`policy::ErrorHandlerSupport`] - Register policies and resolve failures
/// - [`policy::ExceptionPolicyStrategy`] - Pluggable resolution
pub mod policy;

/// Exception type handles and hierarchy
pub mod types;

/// `policyscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `policyscope` Error type
///
/// The main error type for all operations in this crate. Not finding a policy
/// is not an error, see [`policy::ErrorHandlerSupport::get_exception_policy`].
pub use error::Error;

pub use config::ResolverConfig;
pub use exchange::{Exchange, RouteContext};
pub use failure::{CauseChain, Failure, FailureRc};
pub use policy::{ErrorHandlerSupport, ExceptionPolicies};
