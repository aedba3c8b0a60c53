use anyhow::{Context, Result};

use crate::llm_client::Provider;

/// Application configuration loaded from environment variables.
/// Provider credentials are optional: a missing key only disables that provider.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub llm_timeout_secs: u64,
    pub min_resume_words: usize,
    pub max_upload_bytes: usize,
    pub session_idle_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: optional_env(Provider::OpenAi.credential_env()),
            anthropic_api_key: optional_env(Provider::Anthropic.credential_env()),
            google_api_key: optional_env(Provider::Google.credential_env()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            min_resume_words: parse_env("MIN_RESUME_WORDS", 50)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            session_idle_minutes: parse_env("SESSION_IDLE_MINUTES", 120)?,
        })
    }

    /// Returns the credential configured for `provider`, if any.
    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Anthropic => self.anthropic_api_key.as_deref(),
            Provider::Google => self.google_api_key.as_deref(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            google_api_key: None,
            port: 8080,
            rust_log: "info".to_string(),
            llm_timeout_secs: 120,
            min_resume_words: 50,
            max_upload_bytes: 5 * 1024 * 1024,
            session_idle_minutes: 120,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
