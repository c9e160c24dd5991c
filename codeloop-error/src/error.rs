//! The main Error type for codeloop

use crate::{ErrorCategory, ErrorKind, ErrorStatus};
use std::fmt;
use std::path::Path;

/// The unified error type for all codeloop operations.
///
/// This error type provides:
/// - `kind`: What type of error occurred
/// - `message`: Human-readable description
/// - `status`: Whether rerunning may help
/// - `operation`: What operation caused the error
/// - `context`: Key-value pairs for debugging
/// - `source`: The underlying error (if any)
///
/// # Example
///
/// ```rust
/// use codeloop_error::{Error, ErrorKind, ErrorStatus};
///
/// let err = Error::new(ErrorKind::NetworkFailed, "connection reset")
///     .with_operation("prem::complete")
///     .with_context("url", "https://app.premai.io/v1/chat/completions");
///
/// assert_eq!(err.kind(), ErrorKind::NetworkFailed);
/// assert_eq!(err.status(), ErrorStatus::Temporary);
/// assert_eq!(err.exit_code(), 1);
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = if kind.is_retryable() {
            ErrorStatus::Temporary
        } else {
            ErrorStatus::Permanent
        };

        Self {
            kind,
            message: message.into(),
            status,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the phase the error belongs to
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error status
    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Get the operation that caused this error
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Get the context key-value pairs
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Get every context value recorded under `key`, in insertion order
    pub fn context_values(&self, key: &str) -> Vec<&str> {
        self.context
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Get the source error (if any)
    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    /// Process exit status for this error.
    ///
    /// Failures before the completion call exit with 2, everything after it
    /// (and anything unclassified) exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input => 2,
            ErrorCategory::Upstream | ErrorCategory::Internal => 1,
        }
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    /// Mark as temporary (rerun may help)
    pub fn temporary(mut self) -> Self {
        self.status = ErrorStatus::Temporary;
        self
    }

    /// Mark as permanent
    pub fn permanent(mut self) -> Self {
        self.status = ErrorStatus::Permanent;
        self
    }

    /// Set the operation that caused this error.
    ///
    /// If an operation was already set, the previous one is moved to context
    /// as "called" to preserve the call chain.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    // =========================================================================
    // Status mutations
    // =========================================================================

    /// Mark as persistent after repeated failures
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }

    /// Check if a rerun may help
    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.status)?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format for debugging
// =============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.status)?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }
        writeln!(f)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

// =============================================================================
// std::error::Error implementation
// =============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = io_kind(&err);
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

fn io_kind(err: &std::io::Error) -> ErrorKind {
    match err.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
        std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
        _ => ErrorKind::IoFailed,
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    /// Create an Unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Create a ConfigInvalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Create a CredentialMissing error for an unset environment variable
    pub fn credential_missing(var: impl Into<String>) -> Self {
        let var = var.into();
        Self::new(
            ErrorKind::CredentialMissing,
            format!(
                "Environment variable {} is not set. You can use a .ayup-env file to set it",
                var
            ),
        )
        .with_context("var", var)
    }

    /// Create an InputMissing error naming every path of the violated pair
    pub fn input_missing(first: &Path, second: &Path) -> Self {
        Self::new(
            ErrorKind::InputMissing,
            format!("Both {} and {} are missing", first.display(), second.display()),
        )
        .with_context("path", first.display().to_string())
        .with_context("path", second.display().to_string())
    }

    /// Wrap a read failure, keeping the offending path
    pub fn read_failed(path: &Path, err: std::io::Error) -> Self {
        Self::new(io_kind(&err), format!("Error reading '{}': {}", path.display(), err))
            .with_context("path", path.display().to_string())
            .set_source(err)
    }

    /// Wrap a write failure, keeping the offending path
    pub fn write_failed(path: &Path, err: std::io::Error) -> Self {
        Self::new(io_kind(&err), format!("Error writing '{}': {}", path.display(), err))
            .with_context("path", path.display().to_string())
            .set_source(err)
    }

    /// Create a MalformedResponse error
    pub fn malformed_response(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, reason)
    }

    /// Create a NonTextContent error
    pub fn non_text_content() -> Self {
        Self::new(ErrorKind::NonTextContent, "No message content to write")
    }
}
