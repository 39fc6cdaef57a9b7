// Shared prompt fragments. Each service that needs LLM calls defines its own prompts.rs alongside
// it; this file only holds cross-cutting pieces.

/// Instruction that keeps generated resumes grounded in the master resume.
pub const FACTUAL_INSTRUCTION: &str = "\
    CRITICAL: Keep all factual content from the master resume. \
    Do NOT invent experience, employers, dates, degrees, or skills. \
    You may reorder, condense, and re-emphasize, but never fabricate.";

/// Instruction for callers that parse the reply as delimited plain text.
pub const PLAIN_TEXT_INSTRUCTION: &str = "\
    Respond in plain text exactly in the requested format. \
    Do NOT use markdown code fences. \
    Do NOT add commentary before or after the formatted output.";
