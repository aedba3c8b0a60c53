use serde::{Deserialize, Serialize};

/// Thresholds for accepting resume text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRules {
    pub min_words: usize,
    pub max_chars: usize,
    /// Job descriptions shorter than this get a warning, never a rejection.
    pub min_job_description_words: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_words: 50,
            max_chars: 50_000,
            min_job_description_words: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub word_count: usize,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Checks that the text is plausibly a resume before spending a provider call on it.
pub fn validate_resume_text(text: &str, rules: &ValidationRules) -> ValidationReport {
    let trimmed = text.trim();
    let word_count = count_words(trimmed);
    let mut issues = Vec::new();

    if trimmed.is_empty() {
        issues.push("Resume text is empty".to_string());
    } else {
        if word_count < rules.min_words {
            issues.push(format!(
                "Resume has {word_count} words; at least {} are required",
                rules.min_words
            ));
        }
        if trimmed.chars().count() > rules.max_chars {
            issues.push(format!(
                "Resume is longer than {} characters",
                rules.max_chars
            ));
        }
        if !trimmed.chars().any(|c| c.is_alphabetic()) {
            issues.push("Resume contains no readable words".to_string());
        }
    }

    ValidationReport {
        passed: issues.is_empty(),
        word_count,
        issues,
        warnings: Vec::new(),
    }
}

/// Adds a warning to `report` when a job description was given but is too thin
/// to be useful for keyword matching.
pub fn check_job_description(
    report: &mut ValidationReport,
    job_description: Option<&str>,
    rules: &ValidationRules,
) {
    if let Some(jd) = job_description {
        let words = count_words(jd);
        if words > 0 && words < rules.min_job_description_words {
            report.warnings.push(format!(
                "Job description has only {words} words; keyword matching may be limited"
            ));
        }
    }
}
