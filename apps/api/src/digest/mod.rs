// Digest: link normalization, LLM digest generation and parsing the digest back into jobs.
// All LLM calls go through llm_client.

pub mod generator;
pub mod link;
pub mod parser;
pub mod prompts;
