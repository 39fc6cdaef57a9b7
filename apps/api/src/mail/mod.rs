//! Mail collaborators: where the pipeline's raw job links come from, and where digests go.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

pub mod anchors;
pub mod gmail;

/// Supplies link strings (`"text — url"`) from unread alert messages.
///
/// Results are deduplicated by exact string, in first-seen order. Implementations may mark the
/// source messages read as a side effect.
#[async_trait]
pub trait LinkSource: Send + Sync {
    async fn collect_links(&self) -> Result<Vec<String>>;
}

/// Delivers a finished digest as a plain-text email.
#[async_trait]
pub trait DigestMailer: Send + Sync {
    async fn send_digest(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API error (status {status}): {message}")]
    Api { status: u16, message: String },
}
