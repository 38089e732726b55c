use async_trait::async_trait;
use tracing::debug;

use super::{require_key, send_json, Provider, ProviderError};
use crate::api::{ChatCompletion, ChatMessage, ChatRequest};
use crate::core::config::{ProviderKind, ProviderSettings};
use crate::utils::url::construct_api_url;

pub const GROK_SYSTEM_PROMPT: &str =
    "You are Grok, a chatbot inspired by the Hitchhiker's Guide to the Galaxy.";

/// xAI's OpenAI-compatible chat completions endpoint.
pub struct GrokProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl GrokProvider {
    pub fn new(client: reqwest::Client, settings: &ProviderSettings, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            max_tokens: settings.max_tokens,
        }
    }
}

#[async_trait]
impl Provider for GrokProvider {
    fn name(&self) -> &str {
        ProviderKind::Grok.display_name()
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = require_key(&self.api_key, ProviderKind::Grok)?;
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(GROK_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ],
            stream: false,
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "requesting Grok completion");
        let completion: ChatCompletion = send_json(
            self.client
                .post(construct_api_url(&self.base_url, "chat/completions"))
                .bearer_auth(api_key)
                .json(&request),
        )
        .await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or(ProviderError::EmptyResponse {
                provider: ProviderKind::Grok.display_name(),
            })
    }
}
