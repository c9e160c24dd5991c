//! Prem chat completions provider
//!
//! One POST per run. The body is read as text and classified by hand so a
//! 200 with an unexpected shape becomes [`Completion::MalformedResponse`]
//! rather than a transport error.

use super::*;
use crate::error::Result;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://app.premai.io";

/// Prem provider
pub struct PremProvider {
    client: Client,
    config: ProviderConfig,
}

impl PremProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| {
            Error::new(ErrorKind::ConfigInvalid, "Failed to create HTTP client")
                .with_operation("prem::new")
                .set_source(e)
        })?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

impl LlmProvider for PremProvider {
    fn name(&self) -> &str {
        "prem"
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<Completion, ProviderError> {
        let body = PremRequest {
            project_id: request.project_id,
            system_prompt: &request.system_prompt,
            messages: &request.messages,
            temperature: request.temperature,
            stream: false,
            model: request.model.as_deref(),
        };

        let mut req = self.client.post(self.endpoint()).json(&body);

        if !self.config.api_key.is_empty() {
            req = req.bearer_auth(&self.config.api_key);
        }

        let response = req.send().await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { retry_after },
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationFailed,
                _ => ProviderError::Api { status: status.as_u16(), message: text },
            });
        }

        let text = response.text().await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        debug!(bytes = text.len(), "prem response received");

        Ok(classify(&text))
    }
}

/// Classify a success body
pub fn classify(body: &str) -> Completion {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => return Completion::MalformedResponse(format!("response is not JSON: {}", e)),
    };

    let Some(choices) = value.get("choices").and_then(Value::as_array) else {
        return Completion::MalformedResponse("response has no choices array".into());
    };

    let Some(first) = choices.first() else {
        return Completion::MalformedResponse("response has an empty choices array".into());
    };

    let Some(message) = first.get("message").filter(|m| m.is_object()) else {
        return Completion::MalformedResponse("first choice has no message".into());
    };

    if let Some(model) = value.get("model").and_then(Value::as_str) {
        debug!(model, "completion model");
    }
    if let Some(usage) = value.get("usage") {
        debug!(%usage, "completion usage");
    }

    match message.get("content") {
        Some(Value::String(content)) => Completion::Success(content.clone()),
        other => {
            warn!(content = ?other, "completion content is not text");
            Completion::NonTextContent
        }
    }
}

// ============================================================================
// Prem API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct PremRequest<'a> {
    project_id: u64,
    system_prompt: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}
