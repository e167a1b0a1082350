use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{ProviderKind, ProviderSettings};
use crate::web::models::{Message, Role};

/// Returned when the provider answers but the completion text is missing
/// or malformed. The chat contract never fails on that case.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a reply.";

const PROBE_PROMPT: &str = "Reply with the single word: pong";

/// One variant per user-facing failure category. The Display strings are
/// exactly what the chat endpoint puts in the `reply` field.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Server error: no API key is configured for {provider}.")]
    MissingKey { provider: &'static str },

    #[error("Upstream error: the configured API key was rejected.")]
    InvalidKey,

    #[error("Upstream error: the configured API key is not allowed to use this model.")]
    Forbidden,

    #[error("Upstream error: rate limit or quota exceeded, try again later.")]
    RateLimited,

    #[error("Upstream error: the provider reported a server error ({0}).")]
    ServerError(u16),

    #[error("Upstream error: unexpected response status {0}.")]
    Unexpected(u16),

    #[error("Server error: could not reach the model provider.")]
    Transport(#[source] reqwest::Error),
}

/// Client for the configured chat-completion provider.
pub struct UpstreamClient {
    settings: ProviderSettings,
    client: Client,
}

impl UpstreamClient {
    pub fn new(settings: ProviderSettings) -> Self {
        info!(
            "Using {} provider at {} (model {})",
            settings.kind.label(),
            settings.api_base,
            settings.model
        );
        Self {
            settings,
            client: Client::new(),
        }
    }

    /// Sends one chat message upstream and returns the completion text.
    /// Never called with an empty message; the handler screens that first.
    pub async fn complete(&self, message: &str) -> Result<String, UpstreamError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingKey {
                provider: self.settings.kind.label(),
            })?;

        let (url, payload) = self.build_request(message);
        debug!("Upstream request to {}: {}", url, payload);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        info!("Upstream status: {}", status);
        if !status.is_success() {
            return Err(classify_status(status));
        }

        let body: Value = response.json().await.map_err(UpstreamError::Transport)?;
        debug!("Upstream response: {}", body);

        match extract_completion(self.settings.kind, &body) {
            Some(text) => Ok(text),
            None => {
                warn!("Upstream answered without a usable completion");
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }

    /// Connectivity check used by the test endpoint: same request path,
    /// fixed one-word prompt.
    pub async fn probe(&self) -> Result<String, UpstreamError> {
        self.complete(PROBE_PROMPT).await
    }

    fn build_request(&self, message: &str) -> (String, Value) {
        match self.settings.kind {
            ProviderKind::OpenAi => {
                let url = format!("{}/v1/chat/completions", self.settings.api_base);
                let messages = vec![
                    Message {
                        role: Role::System,
                        content: self.settings.system_prompt.clone(),
                    },
                    Message {
                        role: Role::User,
                        content: message.to_string(),
                    },
                ];
                let payload = json!({
                    "model": self.settings.model,
                    "messages": messages,
                    "max_tokens": self.settings.max_tokens,
                });
                (url, payload)
            }
            ProviderKind::HuggingFace => {
                let url = format!("{}/models/{}", self.settings.api_base, self.settings.model);
                let payload = json!({
                    "inputs": format!("{}\n\n{}", self.settings.system_prompt, message),
                    "parameters": {
                        "max_new_tokens": self.settings.max_tokens,
                        "return_full_text": false,
                    },
                });
                (url, payload)
            }
        }
    }
}

fn classify_status(status: StatusCode) -> UpstreamError {
    match status.as_u16() {
        401 => UpstreamError::InvalidKey,
        403 => UpstreamError::Forbidden,
        429 => UpstreamError::RateLimited,
        s if status.is_server_error() => UpstreamError::ServerError(s),
        s => UpstreamError::Unexpected(s),
    }
}

/// Pulls the generated text out of the provider-specific response shape.
fn extract_completion(kind: ProviderKind, body: &Value) -> Option<String> {
    match kind {
        ProviderKind::OpenAi => body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::to_string),
        // The inference API answers either [{"generated_text": ...}] or
        // {"generated_text": ...} depending on the model pipeline.
        ProviderKind::HuggingFace => body
            .get(0)
            .unwrap_or(body)
            .get("generated_text")
            .and_then(|text| text.as_str())
            .map(str::to_string),
    }
}
