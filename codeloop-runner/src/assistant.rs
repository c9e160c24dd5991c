//! Assistant names and the next-assistant marker.
//!
//! The orchestrator resolves the marker written at the end of a round to the
//! assistant it runs next. A name is `kind:name`, or the literal `nil` to stop.

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Where an assistant comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssistantKind {
    /// Shipped with the orchestrator
    Builtin,
    /// Loaded from a directory next to the app
    Local,
    /// Fetched from elsewhere
    Remote,
}

impl AssistantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantKind::Builtin => "builtin",
            AssistantKind::Local => "local",
            AssistantKind::Remote => "remote",
        }
    }
}

impl FromStr for AssistantKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "builtin" => Ok(AssistantKind::Builtin),
            "local" => Ok(AssistantKind::Local),
            "remote" => Ok(AssistantKind::Remote),
            other => Err(Error::invalid_argument(format!("Invalid assistant kind: {}", other))
                .with_operation("assistant::parse")
                .with_context("kind", other)),
        }
    }
}

/// A fully qualified assistant name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssistantName {
    /// No further assistant
    Nil,
    Named { kind: AssistantKind, name: String },
}

impl AssistantName {
    pub fn builtin(name: impl Into<String>) -> Self {
        AssistantName::Named {
            kind: AssistantKind::Builtin,
            name: name.into(),
        }
    }

    pub fn local(name: impl Into<String>) -> Self {
        AssistantName::Named {
            kind: AssistantKind::Local,
            name: name.into(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, AssistantName::Nil)
    }
}

impl fmt::Display for AssistantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantName::Nil => write!(f, "nil"),
            AssistantName::Named { kind, name } => write!(f, "{}:{}", kind.as_str(), name),
        }
    }
}

impl FromStr for AssistantName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "nil" {
            return Ok(AssistantName::Nil);
        }

        let (kind, name) = s.split_once(':').ok_or_else(|| {
            Error::invalid_argument(format!("No ':' in assistant name: {}", s))
                .with_operation("assistant::parse")
                .with_context("name", s)
        })?;

        let kind = kind
            .parse::<AssistantKind>()
            .map_err(|e| e.with_context("name", s))?;

        if name.is_empty() {
            return Err(Error::invalid_argument(format!("Empty assistant name: {}", s))
                .with_operation("assistant::parse")
                .with_context("name", s));
        }

        Ok(AssistantName::Named {
            kind,
            name: name.to_string(),
        })
    }
}

/// Write `next` to `path`, creating parent directories as needed
pub fn write_marker(path: &Path, next: &AssistantName) -> Result<()> {
    crate::bundle::write_file(path, next.to_string().as_bytes())
        .map_err(|e| e.with_operation("assistant::write_marker"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_named() {
        let name: AssistantName = "builtin:python".parse().unwrap();
        assert_eq!(name, AssistantName::builtin("python"));
        assert_eq!(name.to_string(), "builtin:python");

        let name: AssistantName = " local:prem\n".parse().unwrap();
        assert_eq!(name, AssistantName::local("prem"));
    }

    #[test]
    fn test_parse_nil() {
        let name: AssistantName = "nil".parse().unwrap();
        assert!(name.is_nil());
        assert_eq!(name.to_string(), "nil");
    }

    #[test]
    fn test_parse_rejects_bad_names() {
        let err = "python".parse::<AssistantName>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.message().contains("No ':'"));

        let err = "cloud:python".parse::<AssistantName>().unwrap_err();
        assert!(err.message().contains("Invalid assistant kind"));

        let err = "remote:".parse::<AssistantName>().unwrap_err();
        assert!(err.message().contains("Empty assistant name"));
    }

    #[test]
    fn test_parse_error_names_operation() {
        for bad in ["python", "cloud:python", "remote:"] {
            let err = bad.parse::<AssistantName>().unwrap_err();
            assert_eq!(err.operation(), "assistant::parse");
            assert!(err.to_string().contains(" at assistant::parse"));
        }
    }

    #[test]
    fn test_write_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("next");

        write_marker(&path, &AssistantName::builtin("python")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "builtin:python");

        write_marker(&path, &AssistantName::Nil).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "nil");
    }
}
