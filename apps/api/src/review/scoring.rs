//! Scorer: per-category scores in [0, 10], a weighted overall score, and a letter grade.
//!
//! A score reported by the provider wins for its category; otherwise a fixed
//! heuristic over the canonical feedback is used. Pure and deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::review::feedback::Feedback;

pub const CONTENT_RELEVANCE: &str = "content_relevance";
pub const KEYWORD_OPTIMIZATION: &str = "keyword_optimization";
pub const FORMATTING_STRUCTURE: &str = "formatting_structure";
pub const ACHIEVEMENT_IMPACT: &str = "achievement_impact";
pub const SKILLS_ALIGNMENT: &str = "skills_alignment";

pub const CATEGORIES: [&str; 5] = [
    CONTENT_RELEVANCE,
    KEYWORD_OPTIMIZATION,
    FORMATTING_STRUCTURE,
    ACHIEVEMENT_IMPACT,
    SKILLS_ALIGNMENT,
];

const MAX_SCORE: f64 = 10.0;

/// Words that mark a feedback item as being about measurable impact.
const IMPACT_MARKERS: &[&str] = &["quantif", "metric", "measur", "number", "impact", "result"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub weights: BTreeMap<String, f64>,
    /// Weight for any category not listed in `weights`.
    pub fallback: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        let weights = [
            (CONTENT_RELEVANCE, 0.30),
            (KEYWORD_OPTIMIZATION, 0.25),
            (FORMATTING_STRUCTURE, 0.15),
            (ACHIEVEMENT_IMPACT, 0.15),
            (SKILLS_ALIGNMENT, 0.15),
        ]
        .into_iter()
        .map(|(k, w)| (k.to_string(), w))
        .collect();
        Self {
            weights,
            fallback: 1.0,
        }
    }
}

impl ScoringWeights {
    /// Every category weighs the same.
    #[cfg(test)]
    pub fn equal() -> Self {
        Self {
            weights: BTreeMap::new(),
            fallback: 1.0,
        }
    }

    pub fn weight_for(&self, category: &str) -> f64 {
        self.weights
            .get(category)
            .copied()
            .unwrap_or(self.fallback)
            .max(0.0)
    }
}

/// Lower bound of each grade band on the overall score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeCutoffs {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for GradeCutoffs {
    fn default() -> Self {
        Self {
            a: 8.5,
            b: 7.0,
            c: 5.5,
            d: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

pub fn grade_for(overall: f64, cutoffs: &GradeCutoffs) -> Grade {
    match overall {
        s if s >= cutoffs.a => Grade::A,
        s if s >= cutoffs.b => Grade::B,
        s if s >= cutoffs.c => Grade::C,
        s if s >= cutoffs.d => Grade::D,
        _ => Grade::F,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub cutoffs: GradeCutoffs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub breakdown: BTreeMap<String, f64>,
    pub overall: f64,
    pub grade: Grade,
}

impl ScoreBreakdown {
    /// Clamps each category into [0, 10] and derives overall score and grade.
    pub fn from_categories(categories: BTreeMap<String, f64>, config: &ScoringConfig) -> Self {
        let breakdown: BTreeMap<String, f64> = categories
            .into_iter()
            .map(|(k, v)| (k, clamp_score(v)))
            .collect();
        let overall = weighted_mean(&breakdown, &config.weights);
        Self {
            grade: grade_for(overall, &config.cutoffs),
            breakdown,
            overall,
        }
    }
}

/// Σ wᵢ·sᵢ / Σ wᵢ over the categories present. Zero when nothing carries weight.
pub fn weighted_mean(breakdown: &BTreeMap<String, f64>, weights: &ScoringWeights) -> f64 {
    let (weighted_sum, total_weight) = breakdown
        .iter()
        .fold((0.0, 0.0), |(sum, total), (category, score)| {
            let w = weights.weight_for(category);
            (sum + w * score, total + w)
        });
    if total_weight > 0.0 {
        (weighted_sum / total_weight).clamp(0.0, MAX_SCORE)
    } else {
        0.0
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, MAX_SCORE)
    } else {
        0.0
    }
}

/// Computes a `ScoreBreakdown` from canonical feedback.
#[derive(Debug, Clone, Default)]
pub struct ResumeScorer {
    config: ScoringConfig,
}

impl ResumeScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, feedback: &Feedback) -> ScoreBreakdown {
        let categories = CATEGORIES
            .iter()
            .map(|&category| {
                let value = feedback
                    .provider_scores
                    .get(category)
                    .copied()
                    .unwrap_or_else(|| heuristic_score(category, feedback));
                (category.to_string(), value)
            })
            .collect();
        ScoreBreakdown::from_categories(categories, &self.config)
    }
}

fn heuristic_score(category: &str, feedback: &Feedback) -> f64 {
    let strengths = feedback.strengths.len() as f64;
    let weaknesses = feedback.weaknesses.len() as f64;
    let missing = feedback.missing_keywords.len() as f64;

    let raw = match category {
        CONTENT_RELEVANCE => 5.0 + 0.6 * strengths - 0.5 * weaknesses,
        KEYWORD_OPTIMIZATION => 9.0 - 0.6 * missing,
        FORMATTING_STRUCTURE => formatting_score(feedback),
        ACHIEVEMENT_IMPACT => {
            let impact_gaps = feedback
                .weaknesses
                .iter()
                .chain(&feedback.recommendations)
                .filter(|item| mentions_impact(item))
                .count() as f64;
            let quantified_strengths = feedback
                .strengths
                .iter()
                .filter(|s| s.chars().any(|c| c.is_ascii_digit()) || mentions_impact(s))
                .count() as f64;
            7.0 + 0.5 * quantified_strengths - 1.5 * impact_gaps
        }
        SKILLS_ALIGNMENT => match feedback.statistics.skills_count {
            Some(n) => (n as f64 / 15.0 * MAX_SCORE).min(MAX_SCORE) - 0.3 * missing,
            None => 7.0 - 0.4 * missing,
        },
        _ => 5.0,
    };
    clamp_score(raw)
}

fn formatting_score(feedback: &Feedback) -> f64 {
    if !feedback.section_feedback.is_empty() {
        let total: f64 = feedback
            .section_feedback
            .values()
            .map(|s| status_weight(&s.status))
            .sum();
        return total / feedback.section_feedback.len() as f64 * MAX_SCORE;
    }
    match feedback.statistics.sections {
        Some(n) => (n.min(6) as f64 / 6.0) * MAX_SCORE,
        None => 6.0,
    }
}

fn status_weight(status: &str) -> f64 {
    let status = status.to_lowercase();
    if ["strong", "excellent", "good", "✅"].iter().any(|s| status.contains(s)) {
        1.0
    } else if ["adequate", "fair", "moderate"].iter().any(|s| status.contains(s)) {
        0.6
    } else if ["needs", "weak", "poor", "⚠"].iter().any(|s| status.contains(s)) {
        0.3
    } else if status.contains("missing") || status.contains('❌') {
        0.0
    } else {
        0.5
    }
}

fn mentions_impact(text: &str) -> bool {
    let lower = text.to_lowercase();
    IMPACT_MARKERS.iter().any(|m| lower.contains(m))
}
