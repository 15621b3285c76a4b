// Cross-cutting prompt fragments. Services that need specific instructions
// keep their own prompts.rs next to them.

/// System prompt used when a call does not supply its own.
pub const DEFAULT_SYSTEM: &str = "You are a helpful assistant for a career platform. \
    Provide concise, factual answers.";
