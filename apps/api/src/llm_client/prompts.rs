// Shared prompt fragments. Each feature module that calls a provider keeps its
// own prompts.rs alongside it and pulls cross-cutting pieces from here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps feedback tied to what the resume actually says.
pub const GROUNDING_INSTRUCTION: &str = "\
    Base every statement on the resume text provided. Do NOT invent employers, \
    dates, metrics or skills that are not present. Quote or paraphrase the resume \
    when pointing out a strength or a weakness.";
