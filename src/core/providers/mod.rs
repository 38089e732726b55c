//! Text-generation providers.
//!
//! Every hosted API is reduced to one operation, [`Provider::generate`]:
//! prompt in, text out. The per-API request shapes and response parsing
//! live in the submodules.

pub mod cohere;
pub mod gemini;
pub mod grok;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::core::config::{ProviderKind, ProviderSettings};

pub use cohere::CohereProvider;
pub use gemini::GeminiProvider;
pub use grok::GrokProvider;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Name used as the speaker label in transcripts.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

#[derive(Debug)]
pub enum ProviderError {
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },
    Transport(reqwest::Error),
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
    Malformed(serde_json::Error),
    EmptyResponse {
        provider: &'static str,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::MissingApiKey { provider, env_var } => {
                write!(f, "{provider} API key is not configured (set {env_var})")
            }
            ProviderError::Transport(source) => write!(f, "request failed: {source}"),
            ProviderError::Api { status, message } => {
                write!(f, "API request failed with status {status}: {message}")
            }
            ProviderError::Malformed(source) => write!(f, "malformed response: {source}"),
            ProviderError::EmptyResponse { provider } => {
                write!(f, "{provider} returned no text")
            }
        }
    }
}

impl StdError for ProviderError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ProviderError::Transport(source) => Some(source),
            ProviderError::Malformed(source) => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err)
    }
}

/// Shared HTTP client for all providers of a session.
pub fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Build the provider described by `settings`, reading its API key from
/// the environment. A missing key is reported on the first call, not here.
pub fn build_provider(settings: &ProviderSettings, client: reqwest::Client) -> Box<dyn Provider> {
    let api_key = std::env::var(settings.kind.api_key_env())
        .ok()
        .filter(|key| !key.trim().is_empty());

    match settings.kind {
        ProviderKind::Grok => Box::new(GrokProvider::new(client, settings, api_key)),
        ProviderKind::Gemini => Box::new(GeminiProvider::new(client, settings, api_key)),
        ProviderKind::Cohere => Box::new(CohereProvider::new(client, settings, api_key)),
    }
}

pub(crate) fn require_key(
    api_key: &Option<String>,
    kind: ProviderKind,
) -> Result<&str, ProviderError> {
    api_key.as_deref().ok_or(ProviderError::MissingApiKey {
        provider: kind.display_name(),
        env_var: kind.api_key_env(),
    })
}

/// Send `request` and decode a successful JSON body into `T`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        debug!(%status, "provider returned an error status");
        return Err(ProviderError::Api {
            status,
            message: summarize_error_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(ProviderError::Malformed)
}

/// Pull a one-line message out of an API error body, falling back to the
/// raw text.
fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let summary = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .or_else(|| value.get("error").and_then(|v| v.as_str()))
                .or_else(|| value.get("message").and_then(|v| v.as_str()))
                .map(str::to_owned)
        });

    let text = summary.unwrap_or_else(|| trimmed.to_string());
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
