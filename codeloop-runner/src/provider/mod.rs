//! # LLM Provider Interface
//!
//! A trait-based seam between the runner and the hosted completion API.
//!
//! ## Design
//! - `LlmProvider` trait defines the single call the runner makes
//! - `Completion` classifies a successful HTTP exchange instead of leaving
//!   the caller to inspect the response shape
//! - `ProviderError` covers everything that never produced a response body
//! - `PremProvider` talks to the Prem chat completions endpoint

pub mod prem;

pub use prem::PremProvider;

use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Who said it. The system prompt travels separately from the messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub project_id: u64,
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub model: Option<String>,
}

impl CompletionRequest {
    pub fn new(project_id: u64, messages: Vec<ChatMessage>) -> Self {
        Self {
            project_id,
            messages,
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// What came back from a request that reached the endpoint and succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Text content of the first choice
    Success(String),
    /// The body is not a completion object; the string says why
    MalformedResponse(String),
    /// The first choice has no text content
    NonTextContent,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for requests that never produced a usable body
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// API returned an error status
    Api { status: u16, message: String },
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Authentication failed
    AuthenticationFailed,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Convert into the workspace error, tagged with the provider name
    pub fn into_error(self, provider: &str) -> Error {
        let message = self.to_string();
        let err = match &self {
            Self::Network(_) => Error::new(ErrorKind::NetworkFailed, message),
            Self::Api { status, .. } => {
                let err = Error::new(ErrorKind::UpstreamFailed, message)
                    .with_context("status", status.to_string());
                if *status >= 500 {
                    err.temporary()
                } else {
                    err.permanent()
                }
            }
            Self::RateLimited { retry_after } => {
                let err = Error::new(ErrorKind::RateLimited, message);
                match retry_after {
                    Some(secs) => err.with_context("retry_after", secs.to_string()),
                    None => err,
                }
            }
            Self::AuthenticationFailed => Error::new(ErrorKind::AuthenticationFailed, message),
        };
        err.with_operation("provider::complete")
            .with_context("provider", provider.to_string())
            .set_source(self)
    }
}

/// The LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "prem")
    fn name(&self) -> &str;

    /// Send one completion request and classify the answer
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError>;
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn prem(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: prem::DEFAULT_BASE_URL.into(),
            timeout_secs: Some(120),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
