//! The review pipeline: extract → validate → request → structure → score.
//!
//! Steps run strictly in sequence. Any failure aborts the whole run, so a
//! `ReviewReport` is either produced complete or not at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{Provider, ProviderRegistry};
use crate::review::analyzer::analyze_resume;
use crate::review::extractor::{extract_text, ResumeSource};
use crate::review::feedback::{structure_feedback, Feedback};
use crate::review::models::{AnalysisRequest, ReviewSettings};
use crate::review::scoring::{ResumeScorer, ScoreBreakdown};
use crate::review::validation::{
    check_job_description, count_words, validate_resume_text, ValidationRules,
};

/// One user submission, as collected by the HTTP handlers.
#[derive(Debug, Clone)]
pub struct ReviewSubmission {
    pub source: ResumeSource,
    pub job_description: Option<String>,
    pub settings: ReviewSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub feedback: Feedback,
    /// Present whenever scoring was requested.
    pub scores: Option<ScoreBreakdown>,
    pub provider: Provider,
    pub job_role: String,
    /// Non-fatal input warnings (e.g. a very short job description).
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub report: ReviewReport,
    pub resume_text: String,
}

pub async fn run_review(
    providers: &ProviderRegistry,
    rules: &ValidationRules,
    scorer: &ResumeScorer,
    submission: ReviewSubmission,
) -> Result<ReviewOutcome, AppError> {
    let ReviewSubmission {
        source,
        job_description,
        settings,
    } = submission;

    // Step 1: text extraction
    let resume_text = extract_text(source).await?;

    // Step 2: validation
    let mut validation = validate_resume_text(&resume_text, rules);
    if !validation.passed {
        warn!("Rejected resume text: {}", validation.issues.join("; "));
        return Err(AppError::Validation(validation.issues.join("; ")));
    }
    check_job_description(&mut validation, job_description.as_deref(), rules);

    // Step 3: provider resolution happens before any request is attempted
    let provider = settings.provider;
    let llm = providers.get(provider).ok_or_else(|| {
        AppError::Configuration(format!(
            "{} API key not found; set {}",
            provider.display_name(),
            provider.credential_env()
        ))
    })?;

    let request = AnalysisRequest::new(resume_text, job_description, settings);

    // Step 4: the single provider call
    let raw = analyze_resume(&request, llm.as_ref()).await?;

    // Step 5: structure
    let mut feedback = structure_feedback(&raw, &request.options);
    if feedback.statistics.word_count.is_none() {
        feedback.statistics.word_count = Some(count_words(&request.resume_text) as u64);
    }

    // Step 6: score
    let scores = request
        .options
        .include_score
        .then(|| scorer.score(&feedback));

    if let Some(scores) = &scores {
        info!(
            "Review complete via {}: overall {:.1}/10 (grade {})",
            provider, scores.overall, scores.grade
        );
    } else {
        info!("Review complete via {} (scoring disabled)", provider);
    }

    let report = ReviewReport {
        feedback,
        scores,
        provider: request.provider,
        job_role: request.job_role,
        warnings: validation.warnings,
        generated_at: Utc::now(),
    };

    Ok(ReviewOutcome {
        report,
        resume_text: request.resume_text,
    })
}
