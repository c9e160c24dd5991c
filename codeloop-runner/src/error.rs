//! Runner error types
//!
//! Re-exports codeloop-error so callers only depend on this crate.

pub use codeloop_error::{Error, ErrorCategory, ErrorKind, ErrorStatus, Result};
