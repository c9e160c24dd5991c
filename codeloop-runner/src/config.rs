//! # Runner Configuration
//!
//! Everything a run needs to know that is not in the input files:
//! credentials, where the mounted files live, and what language/app shape
//! the generated code must follow.

use crate::assistant::AssistantName;
use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "PREM_API_KEY";

/// Environment variable holding the numeric project id
pub const PROJECT_ID_VAR: &str = "PREM_PROJECT_ID";

// ============================================================================
// Credentials
// ============================================================================

/// Credentials for the hosted completion API
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub project_id: u64,
}

impl Credentials {
    /// Resolve both credentials from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve both credentials through `lookup`.
    ///
    /// Unset and empty variables are treated the same. The API key is checked
    /// first so a bare environment reports the key, not the project.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(&lookup, API_KEY_VAR)?;
        let raw_project = required(&lookup, PROJECT_ID_VAR)?;

        let project_id = raw_project.trim().parse::<u64>().map_err(|e| {
            Error::config_invalid(format!(
                "Environment variable {} must be a numeric project id, got '{}'",
                PROJECT_ID_VAR, raw_project
            ))
            .with_operation("config::credentials")
            .with_context("var", PROJECT_ID_VAR)
            .set_source(e)
        })?;

        Ok(Self { api_key, project_id })
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::credential_missing(var).with_operation("config::credentials")),
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}

// ============================================================================
// Paths
// ============================================================================

/// The named files an assistant reads and writes.
///
/// The orchestrator mounts the previous round under `/in` and collects the
/// new round from `/out`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoPaths {
    /// User-authored description of the app
    pub spec: PathBuf,
    /// Source produced by the previous round
    pub prior_source: PathBuf,
    /// Raw model answer from the previous round
    pub prior_explanation: PathBuf,
    /// Output captured when the previous source was executed
    pub log: PathBuf,
    /// User-authored correction for this round
    pub fix: PathBuf,
    /// Where the generated source goes
    pub source_out: PathBuf,
    /// Where the raw answer goes, if this variant keeps it
    pub explanation_out: Option<PathBuf>,
    /// Where the next-assistant marker goes, if this variant chains
    pub next_out: Option<PathBuf>,
}

impl IoPaths {
    /// The layout used inside the assistant container
    pub fn container_defaults() -> Self {
        Self {
            spec: PathBuf::from("/in/app/spec"),
            prior_source: PathBuf::from("/in/app/__main__.py"),
            prior_explanation: PathBuf::from("/in/app/explanation"),
            log: PathBuf::from("/in/log"),
            fix: PathBuf::from("/in/app/fix"),
            source_out: PathBuf::from("/out/app/__main__.py"),
            explanation_out: None,
            next_out: None,
        }
    }

    /// Lay out every input under `input_dir` and every output under
    /// `output_dir`, using the same file names as the container layout.
    pub fn rooted(input_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>, file_name: &str) -> Self {
        let input_dir = input_dir.as_ref();
        let output_dir = output_dir.as_ref();
        Self {
            spec: input_dir.join("spec"),
            prior_source: input_dir.join(file_name),
            prior_explanation: input_dir.join("explanation"),
            log: input_dir.join("log"),
            fix: input_dir.join("fix"),
            source_out: output_dir.join(file_name),
            explanation_out: None,
            next_out: None,
        }
    }

    pub fn with_spec(mut self, path: impl Into<PathBuf>) -> Self {
        self.spec = path.into();
        self
    }

    pub fn with_prior_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.prior_source = path.into();
        self
    }

    pub fn with_prior_explanation(mut self, path: impl Into<PathBuf>) -> Self {
        self.prior_explanation = path.into();
        self
    }

    pub fn with_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.log = path.into();
        self
    }

    pub fn with_fix(mut self, path: impl Into<PathBuf>) -> Self {
        self.fix = path.into();
        self
    }

    pub fn with_source_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_out = path.into();
        self
    }

    pub fn with_explanation_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.explanation_out = Some(path.into());
        self
    }

    pub fn with_next_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.next_out = Some(path.into());
        self
    }
}

impl Default for IoPaths {
    fn default() -> Self {
        Self::container_defaults()
    }
}

// ============================================================================
// Generation target
// ============================================================================

/// What the generated program must look like
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTarget {
    /// Fence tag the model must use, and the only tag we extract
    pub language: String,
    /// Name of the single file the blocks are concatenated into
    pub file_name: String,
    /// How the orchestrator will start the program
    pub run_command: String,
    pub port: u16,
    pub bind_address: String,
}

impl GenerationTarget {
    /// A single-file Python web app
    pub fn python() -> Self {
        Self {
            language: "python".into(),
            file_name: "__main__.py".into(),
            run_command: "python __main__.py".into(),
            port: 5000,
            bind_address: "0.0.0.0".into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The fixed system prompt describing the output contract
    pub fn system_prompt(&self) -> String {
        let language = capitalize(&self.language);
        format!(
            r#"
You are a {language} code generation assistant. The code you output inside markdown script tags like:
```{tag}
# {file}
```
Will be concatenated together and written to a file called `{file}`. This file will be executed with `{run}`.

The application must listen on port {port} and bind to all addresses ({bind}) because it will run inside a container on Linux.
"#,
            language = language,
            tag = self.language,
            file = self.file_name,
            run = self.run_command,
            port = self.port,
            bind = self.bind_address,
        )
    }
}

impl Default for GenerationTarget {
    fn default() -> Self {
        Self::python()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Runner configuration
// ============================================================================

/// Everything the runner needs besides credentials and a provider
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub paths: IoPaths,
    pub target: GenerationTarget,
    /// Sampling temperature; zero keeps reruns deterministic
    pub temperature: f32,
    /// Optional model override; the project default is used otherwise
    pub model: Option<String>,
    /// Marker written to `paths.next_out` after a successful run
    pub next_assistant: Option<AssistantName>,
}

impl RunnerConfig {
    pub fn new(paths: IoPaths, target: GenerationTarget) -> Self {
        Self {
            paths,
            target,
            temperature: 0.0,
            model: None,
            next_assistant: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_next_assistant(mut self, next: AssistantName) -> Self {
        self.next_assistant = Some(next);
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new(IoPaths::container_defaults(), GenerationTarget::python())
    }
}
