//! Error types for the Cortado IR.

/// A specialized Result type for Cortado IR operations.
///
/// This is a type alias for the standard library's
/// [`Result`](core::result::Result) type with the error type defaulting to
/// [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors that can occur when navigating the IR.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A branch or switch target label is not mapped by the enclosing method
    #[error("Unknown block label {label} in method {method}")]
    UnknownLabel { label: u32, method: String },
    /// A method has no blocks but an entry block was requested
    #[error("Method {0} has no blocks")]
    EmptyMethod(String),
}
