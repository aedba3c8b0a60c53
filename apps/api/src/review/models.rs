use serde::{Deserialize, Serialize};

use crate::llm_client::Provider;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    #[default]
    Mid,
    Senior,
    Executive,
}

impl ExperienceLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry Level (0-2 years)",
            ExperienceLevel::Mid => "Mid Level (2-5 years)",
            ExperienceLevel::Senior => "Senior Level (5-10 years)",
            ExperienceLevel::Executive => "Executive Level (10+ years)",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDepth {
    Quick,
    #[default]
    Standard,
    Comprehensive,
}

impl AnalysisDepth {
    /// Depth instruction embedded in the analysis prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            AnalysisDepth::Quick => {
                "Give a quick review: at most 3 items per list and only the most important sections."
            }
            AnalysisDepth::Standard => {
                "Give a standard review: 3 to 5 items per list and feedback for every major section."
            }
            AnalysisDepth::Comprehensive => {
                "Give a comprehensive review: up to 8 items per list, feedback for every section, \
                 and concrete rewrite suggestions where useful."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    KeywordsAts,
    FormattingStructure,
    ContentQuality,
    SkillsAssessment,
    AchievementImpact,
}

impl FocusArea {
    pub fn label(&self) -> &'static str {
        match self {
            FocusArea::KeywordsAts => "Keywords & ATS",
            FocusArea::FormattingStructure => "Formatting & Structure",
            FocusArea::ContentQuality => "Content Quality",
            FocusArea::SkillsAssessment => "Skills Assessment",
            FocusArea::AchievementImpact => "Achievement Impact",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_focus_areas() -> Vec<FocusArea> {
    vec![FocusArea::KeywordsAts, FocusArea::ContentQuality]
}

/// Advanced options chosen alongside a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    #[serde(default)]
    pub analysis_depth: AnalysisDepth,
    #[serde(default = "default_focus_areas")]
    pub focus_areas: Vec<FocusArea>,
    #[serde(default = "default_true")]
    pub include_score: bool,
    #[serde(default = "default_true")]
    pub include_suggestions: bool,
    #[serde(default = "default_true")]
    pub generate_keywords: bool,
    #[serde(default = "default_true")]
    pub detailed_feedback: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            analysis_depth: AnalysisDepth::default(),
            focus_areas: default_focus_areas(),
            include_score: true,
            include_suggestions: true,
            generate_keywords: true,
            detailed_feedback: true,
        }
    }
}

fn default_job_role() -> String {
    "Software Engineer".to_string()
}

fn default_industry() -> String {
    "Technology".to_string()
}

/// Target-role configuration for a review. Every field has a default so clients
/// may send a partial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSettings {
    #[serde(default = "default_job_role")]
    pub job_role: String,
    #[serde(default = "default_industry")]
    pub industry: String,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub options: AnalysisOptions,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            job_role: default_job_role(),
            industry: default_industry(),
            experience_level: ExperienceLevel::default(),
            provider: Provider::default(),
            options: AnalysisOptions::default(),
        }
    }
}

/// Everything needed to ask a provider for a review.
/// Built once per submission, after extraction and validation.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub resume_text: String,
    pub job_description: Option<String>,
    pub job_role: String,
    pub industry: String,
    pub experience_level: ExperienceLevel,
    pub provider: Provider,
    pub options: AnalysisOptions,
}

impl AnalysisRequest {
    pub fn new(resume_text: String, job_description: Option<String>, settings: ReviewSettings) -> Self {
        let job_description = job_description
            .map(|jd| jd.trim().to_string())
            .filter(|jd| !jd.is_empty());
        let job_role = match settings.job_role.trim() {
            "" => default_job_role(),
            role => role.to_string(),
        };
        let industry = match settings.industry.trim() {
            "" => default_industry(),
            industry => industry.to_string(),
        };
        Self {
            resume_text,
            job_description,
            job_role,
            industry,
            experience_level: settings.experience_level,
            provider: settings.provider,
            options: settings.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_from_empty_object() {
        let settings: ReviewSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ReviewSettings::default());
        assert_eq!(settings.experience_level, ExperienceLevel::Mid);
        assert_eq!(settings.provider, Provider::OpenAi);
        assert!(settings.options.include_score);
        assert_eq!(
            settings.options.focus_areas,
            vec![FocusArea::KeywordsAts, FocusArea::ContentQuality]
        );
    }

    #[test]
    fn test_partial_options_keep_other_defaults() {
        let settings: ReviewSettings = serde_json::from_str(
            r#"{"provider": "google", "options": {"include_score": false, "analysis_depth": "comprehensive"}}"#,
        )
        .unwrap();
        assert_eq!(settings.provider, Provider::Google);
        assert!(!settings.options.include_score);
        assert!(settings.options.generate_keywords);
        assert_eq!(settings.options.analysis_depth, AnalysisDepth::Comprehensive);
    }

    #[test]
    fn test_request_drops_blank_job_description() {
        let req = AnalysisRequest::new(
            "resume".to_string(),
            Some("   \n".to_string()),
            ReviewSettings::default(),
        );
        assert!(req.job_description.is_none());
    }

    #[test]
    fn test_request_blank_role_falls_back() {
        let settings = ReviewSettings {
            job_role: "  ".to_string(),
            ..ReviewSettings::default()
        };
        let req = AnalysisRequest::new("resume".to_string(), None, settings);
        assert_eq!(req.job_role, "Software Engineer");
    }

    #[test]
    fn test_request_blank_industry_falls_back() {
        let settings = ReviewSettings {
            industry: " \t ".to_string(),
            ..ReviewSettings::default()
        };
        let req = AnalysisRequest::new("resume".to_string(), None, settings);
        assert_eq!(req.industry, "Technology");
    }

    #[test]
    fn test_experience_level_serde() {
        let level: ExperienceLevel = serde_json::from_str(r#""executive""#).unwrap();
        assert_eq!(level, ExperienceLevel::Executive);
        assert_eq!(level.label(), "Executive Level (10+ years)");
    }
}
