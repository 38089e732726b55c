use async_trait::async_trait;
use tracing::debug;

use super::{require_key, send_json, Provider, ProviderError};
use crate::api::{
    GeminiContent, GeminiPart, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};
use crate::core::config::{ProviderKind, ProviderSettings};
use crate::utils::url::model_method_url;

/// Google's `generateContent` endpoint.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl GeminiProvider {
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
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        ProviderKind::Gemini.display_name()
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = require_key(&self.api_key, ProviderKind::Gemini)?;
        let request = GenerateContentRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: self.max_tokens.map(|max_output_tokens| GenerationConfig {
                max_output_tokens,
            }),
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "requesting Gemini content");
        let response: GenerateContentResponse = send_json(
            self.client
                .post(model_method_url(&self.base_url, &self.model, "generateContent"))
                .header("x-goog-api-key", api_key)
                .json(&request),
        )
        .await?;

        // A candidate may be split over several parts; the reply is their concatenation.
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty());

        text.ok_or(ProviderError::EmptyResponse {
            provider: ProviderKind::Gemini.display_name(),
        })
    }
}
