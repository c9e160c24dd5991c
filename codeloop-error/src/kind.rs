//! Error kinds for codeloop operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on the kind to decide how to report a failure. Every kind
/// belongs to exactly one [`ErrorCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Invalid configuration or parameters
    ConfigInvalid,

    /// A required credential is not set in the environment
    CredentialMissing,

    /// Invalid argument passed to a function
    InvalidArgument,

    // =========================================================================
    // Input errors
    // =========================================================================
    /// A required pair of input fragments is empty
    InputMissing,

    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    // =========================================================================
    // Upstream errors
    // =========================================================================
    /// Could not reach the completion endpoint
    NetworkFailed,

    /// Rate limit exceeded
    RateLimited,

    /// The endpoint rejected our credentials
    AuthenticationFailed,

    /// The endpoint answered with a non-success status
    UpstreamFailed,

    /// The endpoint answered with something that is not a completion object
    MalformedResponse,

    /// The completion carried no text content
    NonTextContent,

    // =========================================================================
    // Internal
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,
}

/// The phase of a run an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Raised before any file is read
    Configuration,
    /// Raised while reading, validating or writing the mounted files
    Input,
    /// Raised by the completion call or while interpreting its answer
    Upstream,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // Configuration
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::CredentialMissing => "CredentialMissing",
            ErrorKind::InvalidArgument => "InvalidArgument",

            // Input
            ErrorKind::InputMissing => "InputMissing",
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",

            // Upstream
            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::UpstreamFailed => "UpstreamFailed",
            ErrorKind::MalformedResponse => "MalformedResponse",
            ErrorKind::NonTextContent => "NonTextContent",

            ErrorKind::Unexpected => "Unexpected",
        }
    }

    /// The phase this kind of error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::ConfigInvalid | ErrorKind::CredentialMissing | ErrorKind::InvalidArgument => {
                ErrorCategory::Configuration
            }
            ErrorKind::InputMissing
            | ErrorKind::FileNotFound
            | ErrorKind::PermissionDenied
            | ErrorKind::IoFailed => ErrorCategory::Input,
            ErrorKind::NetworkFailed
            | ErrorKind::RateLimited
            | ErrorKind::AuthenticationFailed
            | ErrorKind::UpstreamFailed
            | ErrorKind::MalformedResponse
            | ErrorKind::NonTextContent => ErrorCategory::Upstream,
            ErrorKind::Unexpected => ErrorCategory::Internal,
        }
    }

    /// Check if a rerun is likely to succeed for this kind by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::NetworkFailed | ErrorKind::RateLimited | ErrorKind::UpstreamFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Upstream => write!(f, "upstream"),
            ErrorCategory::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::InputMissing.to_string(), "InputMissing");
        assert_eq!(ErrorKind::MalformedResponse.to_string(), "MalformedResponse");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::CredentialMissing.is_retryable());
        assert!(!ErrorKind::MalformedResponse.is_retryable());
    }

    #[test]
    fn test_categories() {
        assert_eq!(ErrorKind::CredentialMissing.category(), ErrorCategory::Configuration);
        assert_eq!(ErrorKind::InputMissing.category(), ErrorCategory::Input);
        assert_eq!(ErrorKind::IoFailed.category(), ErrorCategory::Input);
        assert_eq!(ErrorKind::NonTextContent.category(), ErrorCategory::Upstream);
        assert_eq!(ErrorCategory::Upstream.to_string(), "upstream");
    }
}
