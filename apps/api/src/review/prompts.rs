// All provider prompt constants for the review module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Role description for the analysis call. JSON_ONLY_SYSTEM is appended at call time.
pub const ANALYSIS_SYSTEM: &str = "You are an experienced technical recruiter and resume coach. \
    You review resumes against a target role and give specific, actionable feedback.";

/// Analysis prompt template.
/// Replace: {grounding_instruction}, {job_role}, {industry}, {experience_level},
///          {depth_instruction}, {focus_areas}, {job_description}, {resume_text}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

TARGET ROLE: {job_role}
INDUSTRY: {industry}
EXPERIENCE LEVEL: {experience_level}

DEPTH: {depth_instruction}
FOCUS AREAS (weight your feedback towards these): {focus_areas}

JOB DESCRIPTION:
{job_description}

RESUME:
{resume_text}

Return a JSON object with this EXACT schema:
{
  "summary": "2-3 sentence overall assessment",
  "key_insights": ["short observation"],
  "strengths": ["specific strength, citing the resume"],
  "weaknesses": ["specific weakness, citing the resume"],
  "recommendations": ["concrete action the candidate should take"],
  "missing_keywords": ["keyword expected for the role but absent from the resume"],
  "section_feedback": {
    "experience": {"status": "strong | adequate | needs_work | missing", "feedback": "..."},
    "education": {"status": "...", "feedback": "..."},
    "skills": {"status": "...", "feedback": "..."},
    "summary": {"status": "...", "feedback": "..."}
  },
  "statistics": {
    "word_count": 0,
    "sections": 0,
    "skills_count": 0,
    "experience_years": "e.g. 5+ years"
  },
  "scores": {
    "content_relevance": 0.0,
    "keyword_optimization": 0.0,
    "formatting_structure": 0.0,
    "achievement_impact": 0.0,
    "skills_alignment": 0.0
  }
}

Rules:
1. Every score is a number from 0 to 10 (one decimal place).
2. missing_keywords must come from the job description when one is given; otherwise use keywords typical for the target role.
3. Return an empty array rather than inventing items when nothing applies."#;

/// Substituted for `{job_description}` when the user did not provide one.
pub const NO_JOB_DESCRIPTION: &str =
    "(none provided: judge the resume against typical expectations for the target role)";
