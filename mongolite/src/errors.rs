use backtrace::Backtrace;
#[cfg(feature = "serde")]
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic, ReadExecutor};

/// Error kinds for Mongolite operations
///
/// This enum represents all possible error types that can occur during database
/// operations. Each kind describes a specific category of failure, enabling
/// precise error handling.
///
/// # Examples
///
/// ```rust,ignore
/// use mongolite::errors::{MongoliteError, ErrorKind, MongoliteResult};
///
/// fn example() -> MongoliteResult<()> {
///     Err(MongoliteError::new("Collection not found", ErrorKind::CollectionNotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Filter Errors
    /// Error during filter evaluation or construction
    FilterError,

    // ID and Identity Errors
    /// The provided ID is invalid
    InvalidId,
    /// The requested resource was not found
    NotFound,

    // Operation Errors
    /// The operation is not valid in the current context
    InvalidOperation,

    // IO and Storage Errors
    /// Generic IO error
    IOError,
    /// The file was not found
    FileNotFound,
    /// Permission denied for file operation
    PermissionDenied,
    /// Error encoding or decoding data
    EncodingError,

    // Constraint Violation Errors
    /// A unique constraint was violated (e.g. duplicate `_id` on insert)
    UniqueConstraintViolation,
    /// An update or replace attempted to modify an immutable field
    ImmutableField,

    // Validation Errors
    /// Malformed filter or update expression, bad field name, depth overflow
    ValidationError,
    /// Invalid data type for operation
    InvalidDataType,
    /// Invalid field name
    InvalidFieldName,

    // Collection Errors
    /// Collection does not exist
    CollectionNotFound,

    // Backend and Store Errors
    /// Error from storage backend
    BackendError,
    /// Store has not been initialized
    StoreNotInitialized,
    /// Store has already been closed
    StoreAlreadyClosed,

    // Generic/Internal Errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::ImmutableField => write!(f, "Immutable field"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidDataType => write!(f, "Invalid data type"),
            ErrorKind::InvalidFieldName => write!(f, "Invalid field name"),
            ErrorKind::CollectionNotFound => write!(f, "Collection not found"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::StoreNotInitialized => write!(f, "Store not initialized"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom Mongolite error type.
///
/// `MongoliteError` encapsulates error information including the error message,
/// kind, and optional cause. It supports error chaining and backtraces for
/// debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use mongolite::errors::{MongoliteError, ErrorKind};
///
/// // Create a simple error
/// let err = MongoliteError::new("Collection not found", ErrorKind::CollectionNotFound);
///
/// // Create an error with a cause
/// let cause = MongoliteError::new("IO failed", ErrorKind::IOError);
/// let err = MongoliteError::new_with_cause("Commit failed", ErrorKind::BackendError, cause);
/// ```
///
/// # Type alias
///
/// The `MongoliteResult<T>` type alias is equivalent to `Result<T, MongoliteError>`
/// and is used throughout the codebase for operations that can fail.
#[derive(Clone)]
pub struct MongoliteError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<MongoliteError>>,
    backtrace: Atomic<Backtrace>,
}

impl MongoliteError {
    /// Creates a new `MongoliteError` with the specified message and error kind.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    ///
    /// # Returns
    ///
    /// A new `MongoliteError` instance.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        MongoliteError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `MongoliteError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for debugging.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    /// * `cause` - The underlying error that caused this error
    ///
    /// # Returns
    ///
    /// A new `MongoliteError` instance with the cause error attached.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: MongoliteError) -> Self {
        MongoliteError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&Box<MongoliteError>> {
        self.cause.as_ref()
    }
}

impl Display for MongoliteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for MongoliteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let message = self.message.clone();
                self.backtrace
                    .read_with(|trace| write!(f, "{}\n{:?}", message, trace))
            }
        }
    }
}

impl Error for MongoliteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for Mongolite operations.
///
/// `MongoliteResult<T>` is shorthand for `Result<T, MongoliteError>`.
/// All fallible operations return this type.
///
/// # Examples
///
/// ```rust,ignore
/// use mongolite::errors::MongoliteResult;
///
/// fn find_collection(name: &str) -> MongoliteResult<String> {
///     Ok(name.to_string())
/// }
/// ```
pub type MongoliteResult<T> = Result<T, MongoliteError>;

#[cfg(feature = "serde")]
impl de::Error for MongoliteError {
    fn custom<T: Display>(msg: T) -> Self {
        MongoliteError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

#[cfg(feature = "serde")]
impl ser::Error for MongoliteError {
    fn custom<T: Display>(msg: T) -> Self {
        MongoliteError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

// From trait implementations for automatic error conversion
impl From<std::io::Error> for MongoliteError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IOError,
        };
        MongoliteError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<std::string::FromUtf8Error> for MongoliteError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        MongoliteError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<String> for MongoliteError {
    fn from(msg: String) -> Self {
        MongoliteError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for MongoliteError {
    fn from(msg: &str) -> Self {
        MongoliteError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_new_creates_error() {
        let error = MongoliteError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(error.message, "An error occurred");
        assert_eq!(error.error_kind, ErrorKind::IOError);
        assert!(error.cause.is_none());
    }

    #[test]
    fn error_new_with_cause_creates_error() {
        let cause = MongoliteError::new("IO Error", ErrorKind::IOError);
        let error = MongoliteError::new_with_cause("Commit failed", ErrorKind::BackendError, cause);
        assert_eq!(error.message, "Commit failed");
        assert_eq!(error.error_kind, ErrorKind::BackendError);
        assert!(error.cause.is_some());
    }

    #[test]
    fn error_message_returns_message() {
        let error = MongoliteError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(error.message(), "An error occurred");
    }

    #[test]
    fn error_kind_returns_kind() {
        let error = MongoliteError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(error.kind(), &ErrorKind::IOError);
    }

    #[test]
    fn error_cause_returns_cause() {
        let cause = MongoliteError::new("IO Error", ErrorKind::IOError);
        let error = MongoliteError::new_with_cause("Wrapped", ErrorKind::BackendError, cause);
        assert!(error.cause().is_some());
        assert_eq!(error.cause().unwrap().kind(), &ErrorKind::IOError);
    }

    #[test]
    fn error_display_shows_message() {
        let error = MongoliteError::new("display me", ErrorKind::InternalError);
        assert_eq!(format!("{}", error), "display me");
    }

    #[test]
    fn error_source_chains_cause() {
        let cause = MongoliteError::new("inner", ErrorKind::IOError);
        let error = MongoliteError::new_with_cause("outer", ErrorKind::BackendError, cause);
        let source = error.source().unwrap();
        assert_eq!(source.to_string(), "inner");
    }

    #[test]
    fn io_error_conversion_maps_kind() {
        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: MongoliteError = not_found.into();
        assert_eq!(error.kind(), &ErrorKind::FileNotFound);

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: MongoliteError = denied.into();
        assert_eq!(error.kind(), &ErrorKind::PermissionDenied);

        let other = std::io::Error::other("boom");
        let error: MongoliteError = other.into();
        assert_eq!(error.kind(), &ErrorKind::IOError);
    }

    #[test]
    fn string_conversions_use_internal_error() {
        let error: MongoliteError = "oops".into();
        assert_eq!(error.kind(), &ErrorKind::InternalError);

        let error: MongoliteError = String::from("oops").into();
        assert_eq!(error.kind(), &ErrorKind::InternalError);
    }

    #[test]
    fn error_kind_display_is_stable() {
        assert_eq!(
            format!("{}", ErrorKind::UniqueConstraintViolation),
            "Unique constraint violation"
        );
        assert_eq!(format!("{}", ErrorKind::ImmutableField), "Immutable field");
        assert_eq!(format!("{}", ErrorKind::ValidationError), "Validation error");
    }
}
