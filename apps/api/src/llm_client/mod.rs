//! LLM client, the single point of entry for all provider API calls.
//!
//! No other module may call a provider API directly. Callers go through the
//! `CompletionProvider` trait, resolved from the `ProviderRegistry` in `AppState`.
//!
//! Each submission issues exactly one request. There is no retry: rate limits,
//! timeouts and server errors surface to the user as-is.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub mod prompts;
pub mod providers;

pub use providers::Provider;
use providers::{
    gemini_url, AnthropicRequest, AnthropicResponse, GeminiRequest, GeminiResponse,
    OpenAiRequest, OpenAiResponse, ProviderErrorEnvelope, ANTHROPIC_API_URL, ANTHROPIC_VERSION,
    OPENAI_API_URL,
};

const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(err)
        }
    }
}

/// A hosted model that turns a system + user prompt into text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn provider(&self) -> Provider;

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

/// Calls the provider and deserializes the text response as JSON.
/// The prompt must instruct the model to return valid JSON.
pub async fn complete_json<T: DeserializeOwned>(
    llm: &dyn CompletionProvider,
    prompt: &str,
    system: &str,
) -> Result<T, LlmError> {
    let text = llm.complete(prompt, system).await?;
    let text = strip_json_fences(&text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// HTTP client for one provider. Holds its credential and a shared `reqwest::Client`.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    provider: Provider,
    api_key: String,
}

impl LlmClient {
    pub fn new(provider: Provider, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            provider,
            api_key,
        })
    }

    fn build_request(&self, prompt: &str, system: &str) -> RequestBuilder {
        let model = self.provider.model();
        match self.provider {
            Provider::OpenAi => self
                .client
                .post(OPENAI_API_URL)
                .bearer_auth(&self.api_key)
                .json(&OpenAiRequest::new(model, MAX_TOKENS, system, prompt)),
            Provider::Anthropic => self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&AnthropicRequest::new(model, MAX_TOKENS, system, prompt)),
            Provider::Google => self
                .client
                .post(gemini_url(model))
                .header("x-goog-api-key", &self.api_key)
                .json(&GeminiRequest::new(MAX_TOKENS, system, prompt)),
        }
    }

    async fn read_text(&self, response: Response) -> Result<String, LlmError> {
        let text = match self.provider {
            Provider::OpenAi => {
                let body: OpenAiResponse = response.json().await?;
                if let Some(usage) = &body.usage {
                    debug!(
                        "openai call succeeded: prompt_tokens={}, completion_tokens={}",
                        usage.prompt_tokens, usage.completion_tokens
                    );
                }
                body.text().map(str::to_owned)
            }
            Provider::Anthropic => {
                let body: AnthropicResponse = response.json().await?;
                debug!(
                    "anthropic call succeeded: input_tokens={}, output_tokens={}",
                    body.usage.input_tokens, body.usage.output_tokens
                );
                body.text().map(str::to_owned)
            }
            Provider::Google => {
                let body: GeminiResponse = response.json().await?;
                if let Some(usage) = &body.usage_metadata {
                    debug!(
                        "google call succeeded: prompt_tokens={}, candidate_tokens={}",
                        usage.prompt_token_count, usage.candidates_token_count
                    );
                }
                body.text().map(str::to_owned)
            }
        };
        text.filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.build_request(prompt, system).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("{} API returned {}: {}", self.provider, status, message);
            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited(message));
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        self.read_text(response).await
    }
}

/// Whether a provider can be used, as shown to the dashboard before any call.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub provider: Provider,
    pub display_name: &'static str,
    pub model: &'static str,
    pub configured: bool,
    pub credential_env: &'static str,
}

/// The configured providers, keyed by `Provider`.
/// A provider without a credential is simply absent.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    clients: HashMap<Provider, Arc<dyn CompletionProvider>>,
}

impl ProviderRegistry {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.llm_timeout_secs);
        let mut registry = Self::default();
        for provider in Provider::ALL {
            match config.api_key(provider) {
                Some(key) => {
                    let client = LlmClient::new(provider, key.to_string(), timeout)?;
                    registry = registry.with_provider(Arc::new(client));
                    info!("{} configured (model: {})", provider.display_name(), provider.model());
                }
                None => warn!(
                    "{} API key not found; set {} to enable it",
                    provider.display_name(),
                    provider.credential_env()
                ),
            }
        }
        Ok(registry)
    }

    pub fn with_provider(mut self, client: Arc<dyn CompletionProvider>) -> Self {
        self.clients.insert(client.provider(), client);
        self
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn CompletionProvider>> {
        self.clients.get(&provider).cloned()
    }

    pub fn status(&self) -> Vec<ProviderStatus> {
        Provider::ALL
            .iter()
            .map(|&provider| ProviderStatus {
                provider,
                display_name: provider.display_name(),
                model: provider.model(),
                configured: self.clients.contains_key(&provider),
                credential_env: provider.credential_env(),
            })
            .collect()
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
