//! # codeloop-error
//!
//! Unified error handling for codeloop assistants.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what went wrong (e.g., CredentialMissing, MalformedResponse)
//! - **ErrorCategory**: Know which phase failed (configuration, input, upstream)
//! - **ErrorStatus**: Tell the orchestrator whether a rerun may help
//! - **Error Context**: Paths, variables and status codes attached as key/values
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use codeloop_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::InputMissing, "Both /in/app/fix and /in/app/spec are missing")
//!         .with_operation("bundle::validate")
//!         .with_context("path", "/in/app/fix")
//!         .with_context("path", "/in/app/spec"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All fallible functions return `Result<T, codeloop_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Errors are never retried in-process; the status is advice for whoever reruns us
//! - One top-level handler turns an error into a log line and an exit code

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::{ErrorCategory, ErrorKind};
pub use status::ErrorStatus;

/// Result type alias using codeloop Error
pub type Result<T> = std::result::Result<T, Error>;
