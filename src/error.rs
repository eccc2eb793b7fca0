use thiserror::Error;

/// Helper macro for creating malformed declaration errors with source location information.
///
/// This macro simplifies the creation of [`crate::Error::Malformed`] errors by automatically
/// capturing the current file and line number where the error was detected.
///
/// # Arguments
///
/// * `msg` - A message describing what is wrong with the declaration
/// * `fmt, args...` - A format string and its arguments
///
/// # Examples
///
/// ```rust,ignore
/// let error = malformed_error!("Policy has no output stage");
/// let error = malformed_error!("Route scoped policy '{}' has no route", id);
/// ```
macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Note that "no policy matched" is not an error. Resolution reports that outcome as `None`
/// and leaves the fallback decision to the caller.
///
/// # Error Categories
///
/// ## Configuration Errors
/// - [`Error::StrategyNotConfigured`] - Resolution attempted without a strategy
/// - [`Error::Malformed`] - Invalid policy declaration
///
/// ## Type Errors
/// - [`Error::TypeNotFound`] - Exception type name could not be resolved
/// - [`Error::TypeInsert`] - Conflicting type definition
/// - [`Error::TypeMissingParent`] - Declared parent type is unknown
///
/// ## Guard Errors
/// - [`Error::Guard`] - A guard predicate failed to evaluate
///
/// # Examples
///
/// ```rust
/// use policyscope::{Error, ErrorHandlerSupport, Exchange, Failure, ResolverConfig};
/// use policyscope::types::{BuiltinKind, ExceptionTypeRegistry};
///
/// let types = ExceptionTypeRegistry::new();
/// let failure = Failure::new(types.get_builtin(BuiltinKind::IOException)?, "disk gone");
/// let config = ResolverConfig {
///     install_default_strategy: false,
///     ..ResolverConfig::default()
/// };
/// let handler = ErrorHandlerSupport::with_config(config);
///
/// match handler.get_exception_policy(&Exchange::new("ex-1"), &failure) {
///     Err(Error::StrategyNotConfigured) => println!("no strategy installed"),
///     Ok(Some(policy)) => println!("handled by {}", policy.id()),
///     Ok(None) => println!("no policy"),
///     Err(e) => println!("Error: {}", e),
/// }
/// # Ok::<(), policyscope::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The exception policy strategy has not been set.
    ///
    /// Resolution requires a strategy. This is a setup defect and is never
    /// caused by the traffic being routed, so retrying cannot fix it.
    #[error("The exception policy strategy has not been set")]
    StrategyNotConfigured,

    /// A policy declaration is invalid.
    ///
    /// The error includes the source location where the problem was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was wrong
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Failed to resolve an exception type by name.
    ///
    /// Raised while registering a policy that names an exception type the
    /// [`crate::types::TypeResolver`] does not know about.
    #[error("Failed to resolve exception type - {0}")]
    TypeNotFound(String),

    /// Failed to insert a new type into the `ExceptionTypeRegistry`.
    ///
    /// A type with the same full name but a different parent already exists.
    #[error("Failed to insert exception type, conflicting definition - {0}")]
    TypeInsert(String),

    /// The parent of a new type is missing.
    ///
    /// The associated name is the parent that could not be found.
    #[error("The parent exception type is missing - {0}")]
    TypeMissingParent(String),

    /// A guard predicate failed to evaluate.
    ///
    /// Strategies treat this as the guard evaluating to `false`, so it never
    /// surfaces from resolution. Guard implementations use it to report a
    /// condition they cannot decide.
    #[error("Guard evaluation failed - {0}")]
    Guard(String),
}
