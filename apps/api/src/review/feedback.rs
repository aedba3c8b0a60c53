//! Feedback structurer: reshapes a provider's loosely-typed analysis into the
//! canonical `Feedback` consumed by the dashboard, scorer and exports.
//!
//! Nothing here judges content. Missing fields become empty defaults, odd shapes
//! are coerced where the intent is obvious and dropped otherwise.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::review::models::AnalysisOptions;

/// Feedback for one resume section (experience, education, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionFeedback {
    pub status: String,
    pub feedback: String,
    /// Any extra fields the provider attached to the section.
    #[serde(flatten)]
    pub details: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeStatistics {
    pub word_count: Option<u64>,
    pub sections: Option<u64>,
    pub skills_count: Option<u64>,
    pub experience_years: Option<String>,
}

/// The canonical feedback mapping. Every field is always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub summary: String,
    pub key_insights: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub section_feedback: BTreeMap<String, SectionFeedback>,
    pub statistics: ResumeStatistics,
    /// Category scores reported by the provider, clamped to [0, 10].
    pub provider_scores: BTreeMap<String, f64>,
}

pub fn structure_feedback(raw: &Value, options: &AnalysisOptions) -> Feedback {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let recommendations = if options.include_suggestions {
        string_list(obj.get("recommendations"))
    } else {
        Vec::new()
    };
    let missing_keywords = if options.generate_keywords {
        string_list(obj.get("missing_keywords"))
    } else {
        Vec::new()
    };
    let section_feedback = if options.detailed_feedback {
        sections(obj.get("section_feedback"))
    } else {
        BTreeMap::new()
    };

    Feedback {
        summary: obj
            .get("summary")
            .and_then(text_of)
            .unwrap_or_default(),
        key_insights: string_list(obj.get("key_insights")),
        strengths: string_list(obj.get("strengths")),
        weaknesses: string_list(obj.get("weaknesses")),
        recommendations,
        missing_keywords,
        section_feedback,
        statistics: statistics(obj.get("statistics")),
        // Canonical output stores these under `provider_scores`; raw output uses `scores`.
        provider_scores: scores(obj.get("provider_scores").or_else(|| obj.get("scores"))),
    }
}

/// Accepts a string, or an object carrying its text under a common key.
fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["text", "description", "title", "keyword", "name"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))?
            .to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Normalizes a list: trims entries, drops blanks, removes duplicates in order.
/// A bare string is treated as a one-item list.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match value {
        Some(Value::Array(arr)) => arr.iter().filter_map(text_of).collect(),
        Some(v @ Value::String(_)) => text_of(v).into_iter().collect(),
        _ => Vec::new(),
    };

    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        if !seen.iter().any(|s: &String| s.eq_ignore_ascii_case(&item)) {
            seen.push(item);
        }
    }
    seen
}

fn sections(value: Option<&Value>) -> BTreeMap<String, SectionFeedback> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };

    map.iter()
        .filter_map(|(name, data)| {
            let key = name.trim().to_lowercase().replace(' ', "_");
            if key.is_empty() {
                return None;
            }
            let section = match data {
                Value::Object(fields) => {
                    let details = fields
                        .iter()
                        .filter(|(k, v)| k.as_str() != "status" && k.as_str() != "feedback" && !v.is_null())
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    SectionFeedback {
                        status: fields.get("status").and_then(text_of).unwrap_or_default(),
                        feedback: fields.get("feedback").and_then(text_of).unwrap_or_default(),
                        details,
                    }
                }
                Value::String(_) => SectionFeedback {
                    feedback: text_of(data).unwrap_or_default(),
                    ..SectionFeedback::default()
                },
                _ => return None,
            };
            Some((key, section))
        })
        .collect()
}

/// Reads a non-negative count from a number or a numeric string ("12", "12 skills").
fn count_of(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s
            .split_whitespace()
            .next()
            .and_then(|tok| tok.trim_end_matches('+').parse::<u64>().ok()),
        _ => None,
    }
}

fn statistics(value: Option<&Value>) -> ResumeStatistics {
    let Some(Value::Object(map)) = value else {
        return ResumeStatistics::default();
    };
    ResumeStatistics {
        word_count: count_of(map.get("word_count")),
        sections: count_of(map.get("sections")),
        skills_count: count_of(map.get("skills_count")),
        experience_years: map.get("experience_years").and_then(text_of),
    }
}

/// Reads a score; values in (10, 100] are treated as percentages.
fn score_of(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches("/10").trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    let scaled = if raw > 10.0 && raw <= 100.0 { raw / 10.0 } else { raw };
    Some(scaled.clamp(0.0, 10.0))
}

fn scores(value: Option<&Value>) -> BTreeMap<String, f64> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(k, v)| score_of(v).map(|s| (k.trim().to_lowercase(), s)))
        .collect()
}
