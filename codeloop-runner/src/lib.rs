//! # codeloop runner
//!
//! A single-shot code generation assistant. An orchestrator mounts the
//! previous round's files, runs us once, and collects the new source file.
//!
//! ## Core Concepts
//! - **Input bundle**: spec, prior source, prior explanation, execution log, fix note
//! - **Conversation**: rebuilt from the bundle on every run, never persisted
//! - **Provider**: trait-based access to the hosted completion API (Prem)
//! - **Extraction**: fenced blocks tagged with the target language, concatenated
//! - **Marker**: names the assistant the orchestrator should run next

pub mod assistant;
pub mod bundle;
pub mod config;
pub mod conversation;
pub mod error;
pub mod markdown;
pub mod provider;
pub mod runner;
pub mod scaffold;

pub use assistant::{AssistantKind, AssistantName};
pub use bundle::{InputBundle, OutputBundle};
pub use config::{Credentials, GenerationTarget, IoPaths, RunnerConfig};
pub use conversation::Conversation;
pub use error::{Error, ErrorCategory, ErrorKind, ErrorStatus, Result};
pub use provider::{
    ChatMessage, Completion, CompletionRequest, LlmProvider, PremProvider, ProviderConfig,
    ProviderError, Role,
};
pub use runner::{RunOutcome, Runner};
