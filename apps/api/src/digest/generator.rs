//! Digest generation — hands new job links and the master resume to the LLM.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::digest::parser::BLOCK_RULE;
use crate::digest::prompts::{DIGEST_PROMPT_TEMPLATE, DIGEST_SYSTEM};
use crate::llm_client::prompts::{FACTUAL_INSTRUCTION, PLAIN_TEXT_INSTRUCTION};
use crate::llm_client::LlmClient;

/// Produces raw digest text from the master resume and newline-joined job links.
///
/// The call may be slow; failures propagate to the pipeline untouched.
#[async_trait]
pub trait DigestGenerator: Send + Sync {
    async fn generate(&self, resume: &str, job_links_text: &str) -> Result<String>;
}

/// `DigestGenerator` backed by the shared `LlmClient`.
pub struct LlmDigestGenerator {
    llm: LlmClient,
}

impl LlmDigestGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl DigestGenerator for LlmDigestGenerator {
    async fn generate(&self, resume: &str, job_links_text: &str) -> Result<String> {
        let prompt = build_digest_prompt(resume, job_links_text);
        info!(
            "Requesting digest for {} job links",
            job_links_text.lines().count()
        );

        self.llm
            .complete(&prompt, DIGEST_SYSTEM)
            .await
            .context("Digest generation failed")
    }
}

pub fn build_digest_prompt(resume: &str, job_links_text: &str) -> String {
    // Fixed placeholders first so user-supplied text is never re-scanned for placeholders.
    DIGEST_PROMPT_TEMPLATE
        .replace("{rule}", BLOCK_RULE)
        .replace("{factual_instruction}", FACTUAL_INSTRUCTION)
        .replace("{plain_text_instruction}", PLAIN_TEXT_INSTRUCTION)
        .replacen("{job_text}", job_links_text, 1)
        .replacen("{master_resume}", resume, 1)
}
