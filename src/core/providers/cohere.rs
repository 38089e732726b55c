use async_trait::async_trait;
use tracing::debug;

use super::{require_key, send_json, Provider, ProviderError};
use crate::api::{CohereGenerateRequest, CohereGenerateResponse};
use crate::core::config::{ProviderKind, ProviderSettings};
use crate::utils::url::construct_api_url;

pub struct CohereProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl CohereProvider {
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
impl Provider for CohereProvider {
    fn name(&self) -> &str {
        ProviderKind::Cohere.display_name()
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = require_key(&self.api_key, ProviderKind::Cohere)?;
        let request = CohereGenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "requesting Cohere generation");
        let response: CohereGenerateResponse = send_json(
            self.client
                .post(construct_api_url(&self.base_url, "generate"))
                .bearer_auth(api_key)
                .json(&request),
        )
        .await?;

        response
            .generations
            .into_iter()
            .next()
            .map(|generation| generation.text.trim().to_string())
            .ok_or(ProviderError::EmptyResponse {
                provider: ProviderKind::Cohere.display_name(),
            })
    }
}
