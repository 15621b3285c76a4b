// Prompts used by the generation pipeline.

pub const SUMMARY_SYSTEM: &str = "You are an experienced resume editor. \
    Rewrite professional summaries so they are concise and compelling. \
    Keep every fact from the original and do NOT invent employers, titles, numbers or skills. \
    Reply with the summary text only, without quotes, headings or commentary.";

/// `{summary}` is replaced with the raw summary text.
pub const SUMMARY_PROMPT_TEMPLATE: &str = "Improve this professional summary to be concise and compelling for a resume:

{summary}

Provide a 2-4 sentence professional summary.";

/// Token budget for an improved summary.
pub const SUMMARY_MAX_TOKENS: u32 = 150;
