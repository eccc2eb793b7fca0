use strum::{EnumCount, EnumIter, IntoStaticStr};

/// The builtin exception types every [`super::ExceptionTypeRegistry`] starts with.
///
/// Variants are listed parents first, so iterating in declaration order always
/// registers a parent before its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, IntoStaticStr)]
pub enum BuiltinKind {
    /// Root of every failure hierarchy
    Throwable,
    /// Unrecoverable failures, usually not handled by routes
    Error,
    /// Root of all recoverable failures
    Exception,
    /// Failures that indicate programming errors
    RuntimeException,
    /// Input/output failures
    IOException,
    /// A file or resource could not be found
    FileNotFoundException,
    /// A connection attempt was refused or failed
    ConnectException,
    /// An argument had an invalid value
    IllegalArgumentException,
    /// A string could not be parsed as a number
    NumberFormatException,
    /// An operation was invoked at the wrong time
    IllegalStateException,
    /// An arithmetic operation failed, e.g. division by zero
    ArithmeticException,
    /// A required value was absent
    NullPointerException,
    /// An index was outside the valid range
    IndexOutOfBoundsException,
    /// The requested operation is not supported
    UnsupportedOperationException,
    /// A blocking operation did not complete in time
    TimeoutException,
    /// A waiting thread was interrupted
    InterruptedException,
}

impl BuiltinKind {
    /// The type name this builtin is registered under
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The direct parent of this builtin, `None` for [`BuiltinKind::Throwable`]
    pub fn parent(self) -> Option<BuiltinKind> {
        match self {
            BuiltinKind::Throwable => None,
            BuiltinKind::Error | BuiltinKind::Exception => Some(BuiltinKind::Throwable),
            BuiltinKind::RuntimeException
            | BuiltinKind::IOException
            | BuiltinKind::TimeoutException
            | BuiltinKind::InterruptedException => Some(BuiltinKind::Exception),
            BuiltinKind::FileNotFoundException | BuiltinKind::ConnectException => {
                Some(BuiltinKind::IOException)
            }
            BuiltinKind::NumberFormatException => Some(BuiltinKind::IllegalArgumentException),
            BuiltinKind::IllegalArgumentException
            | BuiltinKind::IllegalStateException
            | BuiltinKind::ArithmeticException
            | BuiltinKind::NullPointerException
            | BuiltinKind::IndexOutOfBoundsException
            | BuiltinKind::UnsupportedOperationException => Some(BuiltinKind::RuntimeException),
        }
    }
}
