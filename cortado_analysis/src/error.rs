//! Error types for the Cortado analyses.
//!
//! Most analysis-level conditions (external call targets, unresolvable
//! dispatch, missing slice seeds, exhausted iteration budgets) degrade to
//! warnings and partial results by policy; the variants here cover the cases
//! that must surface to the caller, plus [`Error::NoConcreteDispatch`], which
//! the graph builders catch and downgrade themselves.

/// A specialized Result type for Cortado analysis operations.
///
/// This is a type alias for the standard library's
/// [`Result`](core::result::Result) type with the error type defaulting to
/// [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors that can occur when building a project or resolving dispatch.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A virtual or interface invoke has no concrete (non-abstract) target
    #[error("No concrete dispatch for {0}")]
    NoConcreteDispatch(String),
    /// A class name is not present in the project's class table
    #[error("Class not found: {0}")]
    ClassNotFound(String),
    /// A `(class, name, params)` method key is not present in the project
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    /// The class-table cache file could not be encoded or decoded
    #[error("Cache error: {0}")]
    CacheError(String),
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
    /// Neither a cache file nor a lifter produced a class table
    #[error("No lifter available and no usable cache for {0}")]
    LifterUnavailable(String),
    /// Error when navigating the IR
    #[error(transparent)]
    IrError(#[from] cortado_ir::Error),
}

/// Convert [`std::io::Error` errors](std::io::Error) to [`IoError`](Error::IoError)
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IoError(error.to_string())
    }
}

/// Convert [`postcard::Error` errors](postcard::Error) to [`CacheError`](Error::CacheError)
impl From<postcard::Error> for Error {
    fn from(error: postcard::Error) -> Self {
        Error::CacheError(error.to_string())
    }
}
