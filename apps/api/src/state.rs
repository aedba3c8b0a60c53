use chrono::Duration;

use crate::config::Config;
use crate::llm_client::ProviderRegistry;
use crate::review::scoring::{ResumeScorer, ScoringConfig};
use crate::review::session::SessionStore;
use crate::review::validation::ValidationRules;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Providers with a credential. Unconfigured ones are absent, not errors.
    pub providers: ProviderRegistry,
    pub sessions: SessionStore,
    pub scorer: ResumeScorer,
    pub validation: ValidationRules,
}

impl AppState {
    pub fn new(config: Config, providers: ProviderRegistry) -> Self {
        Self::with_scoring(config, providers, ScoringConfig::default())
    }

    /// Same as `new`, with explicit category weights and grade cutoffs.
    pub fn with_scoring(config: Config, providers: ProviderRegistry, scoring: ScoringConfig) -> Self {
        let validation = ValidationRules {
            min_words: config.min_resume_words,
            ..ValidationRules::default()
        };
        Self {
            sessions: SessionStore::new(Duration::minutes(config.session_idle_minutes)),
            scorer: ResumeScorer::new(scoring),
            validation,
            providers,
            config,
        }
    }
}
