//! # Input and output bundles
//!
//! An assistant round is a set of small text files. Inputs are all optional
//! on their own: a missing file reads as empty. Two pairs are required
//! together, see [`InputBundle::validate`].

use crate::assistant::AssistantName;
use crate::config::IoPaths;
use crate::error::{Error, Result};
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Read `path` as text. A missing file is empty content; any other failure
/// is an error naming the path.
pub fn read_optional(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(path = %path.display(), bytes = content.len(), "read input");
            Ok(content)
        }
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            debug!(path = %path.display(), "input absent");
            Ok(String::new())
        }
        Err(e) => Err(Error::read_failed(path, e).with_operation("bundle::read_optional")),
    }
}

/// Write `bytes` to `path`, creating parent directories. Not atomic.
pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Error::write_failed(parent, e))?;
        }
    }
    std::fs::write(path, bytes).map_err(|e| Error::write_failed(path, e))
}

// ============================================================================
// Input
// ============================================================================

/// The text fragments one round starts from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBundle {
    pub spec: String,
    pub prior_source: String,
    pub prior_explanation: String,
    pub log: String,
    pub fix: String,
}

impl InputBundle {
    /// Read every fragment named in `paths`
    pub fn read(paths: &IoPaths) -> Result<Self> {
        Ok(Self {
            spec: read_optional(&paths.spec)?,
            prior_source: read_optional(&paths.prior_source)?,
            prior_explanation: read_optional(&paths.prior_explanation)?,
            log: read_optional(&paths.log)?,
            fix: read_optional(&paths.fix)?,
        })
    }

    /// Whether the previous round left anything behind
    pub fn has_prior_output(&self) -> bool {
        !self.prior_source.is_empty() || !self.prior_explanation.is_empty()
    }

    /// Check the required pairs.
    ///
    /// There must be something to start from (a spec or prior output) and
    /// something to ask for (a spec or a fix note).
    pub fn validate(&self, paths: &IoPaths) -> Result<()> {
        if self.spec.is_empty() && !self.has_prior_output() {
            return Err(Error::input_missing(&paths.prior_source, &paths.spec)
                .with_context("path", paths.prior_explanation.display().to_string())
                .with_operation("bundle::validate"));
        }

        if self.spec.is_empty() && self.fix.is_empty() {
            return Err(Error::input_missing(&paths.fix, &paths.spec)
                .with_operation("bundle::validate"));
        }

        Ok(())
    }
}

// ============================================================================
// Output
// ============================================================================

/// What one round leaves behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBundle {
    /// Concatenated source, always written
    pub source: String,
    /// Raw model answer
    pub explanation: Option<String>,
    pub next: Option<AssistantName>,
}

/// Which optional outputs were actually written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Written {
    pub explanation: bool,
    pub next: bool,
}

impl OutputBundle {
    /// Write the bundle. Optional parts are written only when the variant
    /// configured a path for them.
    pub fn write(&self, paths: &IoPaths) -> Result<Written> {
        let mut written = Written::default();

        if let (Some(text), Some(path)) = (&self.explanation, &paths.explanation_out) {
            write_file(path, text.as_bytes()).map_err(|e| e.with_operation("bundle::write"))?;
            info!(path = %path.display(), "explanation written");
            written.explanation = true;
        }

        write_file(&paths.source_out, self.source.as_bytes())
            .map_err(|e| e.with_operation("bundle::write"))?;
        info!(path = %paths.source_out.display(), bytes = self.source.len(), "File written");

        if let (Some(next), Some(path)) = (&self.next, &paths.next_out) {
            crate::assistant::write_marker(path, next)?;
            info!(path = %path.display(), next = %next, "next assistant written");
            written.next = true;
        }

        Ok(written)
    }
}
