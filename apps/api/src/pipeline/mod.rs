//! Digest pipeline — orchestrates one run end to end.
//!
//! Flow: load resume → collect links → drop already-seen links → generate digest →
//!       parse digest → (optionally) email digest → mark links seen → return jobs.
//!
//! The seen-store is only written after a digest was produced (and delivered, when a mailer is
//! configured), so a failed run never marks jobs as seen.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::digest::generator::DigestGenerator;
use crate::digest::link::canonical_url;
use crate::digest::parser::parse_digest;
use crate::mail::{DigestMailer, LinkSource};
use crate::models::job::JobRecord;
use crate::resume::{ResumeError, ResumeProvider};
use crate::seen_store::SeenJobStore;

/// Non-terminal pipeline stages. Terminal states are the variants of `RunOutcome` and
/// `PipelineError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    Fetching,
    Filtering,
    Generating,
    Parsing,
    Delivering,
    Persisting,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Init => "init",
            PipelineStage::Fetching => "fetching links",
            PipelineStage::Filtering => "filtering links",
            PipelineStage::Generating => "generating digest",
            PipelineStage::Parsing => "parsing digest",
            PipelineStage::Delivering => "emailing digest",
            PipelineStage::Persisting => "persisting seen jobs",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A prerequisite is missing; nothing was fetched or generated.
    #[error("{0}")]
    MissingResource(#[from] ResumeError),

    /// The link source, digest generator or mailer failed.
    #[error("{stage} failed: {source:#}")]
    Collaborator {
        stage: PipelineStage,
        #[source]
        source: anyhow::Error,
    },
}

/// Why a run ended without producing a digest. Informational, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoWorkReason {
    NoAlerts,
    AllSeen,
}

impl fmt::Display for NoWorkReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoWorkReason::NoAlerts => f.write_str("No new alerts today."),
            NoWorkReason::AllSeen => f.write_str("No new jobs (all already seen)."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub raw_digest: String,
    pub jobs: Vec<JobRecord>,
    /// Set when the seen-store could not be written. Their alerts are already marked read, so
    /// these jobs only return if a later alert re-announces them, and then as duplicates.
    pub persist_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Digest(Digest),
    NoWork(NoWorkReason),
}

/// Flattens a run result into `(raw_digest, jobs, message)`.
///
/// `message` is set for no-work outcomes and failures; `raw_digest` only on success.
/// A seen-store failure is not reported here; read `Digest::persist_error` for it.
pub fn into_parts(
    result: Result<RunOutcome, PipelineError>,
) -> (Option<String>, Vec<JobRecord>, Option<String>) {
    match result {
        Ok(RunOutcome::Digest(digest)) => (Some(digest.raw_digest), digest.jobs, None),
        Ok(RunOutcome::NoWork(reason)) => (None, Vec::new(), Some(reason.to_string())),
        Err(e) => (None, Vec::new(), Some(e.to_string())),
    }
}

/// Keeps links whose canonical URL is not in `seen`, preserving order.
pub fn filter_new_links(links: Vec<String>, seen: &HashSet<String>) -> Vec<String> {
    links
        .into_iter()
        .filter(|link| !seen.contains(canonical_url(link)))
        .collect()
}

/// Where to email each digest, if anywhere.
struct Delivery {
    mailer: Arc<dyn DigestMailer>,
    recipient: String,
}

/// Subject line of emailed digests.
pub const DIGEST_SUBJECT: &str = "Daily Utah CS Job Digest";

pub struct Pipeline {
    link_source: Arc<dyn LinkSource>,
    resume_provider: Arc<dyn ResumeProvider>,
    generator: Arc<dyn DigestGenerator>,
    seen_store: SeenJobStore,
    delivery: Option<Delivery>,
}

impl Pipeline {
    pub fn new(
        link_source: Arc<dyn LinkSource>,
        resume_provider: Arc<dyn ResumeProvider>,
        generator: Arc<dyn DigestGenerator>,
        seen_store: SeenJobStore,
    ) -> Self {
        Self {
            link_source,
            resume_provider,
            generator,
            seen_store,
            delivery: None,
        }
    }

    /// Emails every produced digest to `recipient` before marking its jobs seen.
    pub fn with_mailer(mut self, mailer: Arc<dyn DigestMailer>, recipient: String) -> Self {
        self.delivery = Some(Delivery { mailer, recipient });
        self
    }

    pub async fn run(&self) -> Result<RunOutcome, PipelineError> {
        info!("Pipeline stage: {}", PipelineStage::Init);
        let master_resume = self.resume_provider.load_master_resume()?;

        info!("Pipeline stage: {}", PipelineStage::Fetching);
        let links = self
            .link_source
            .collect_links()
            .await
            .map_err(|source| PipelineError::Collaborator {
                stage: PipelineStage::Fetching,
                source,
            })?;
        if links.is_empty() {
            info!("{}", NoWorkReason::NoAlerts);
            return Ok(RunOutcome::NoWork(NoWorkReason::NoAlerts));
        }

        info!("Pipeline stage: {}", PipelineStage::Filtering);
        let mut seen = self.seen_store.load();
        debug!(
            "Loaded {} seen URLs from {}",
            seen.len(),
            self.seen_store.path().display()
        );
        let fetched = links.len();
        let new_links = filter_new_links(links, &seen);
        info!(
            "{} links fetched, {} new, {} already seen",
            fetched,
            new_links.len(),
            fetched - new_links.len()
        );
        if new_links.is_empty() {
            info!("{}", NoWorkReason::AllSeen);
            return Ok(RunOutcome::NoWork(NoWorkReason::AllSeen));
        }

        info!("Pipeline stage: {}", PipelineStage::Generating);
        let raw_digest = self
            .generator
            .generate(&master_resume, &new_links.join("\n"))
            .await
            .map_err(|source| PipelineError::Collaborator {
                stage: PipelineStage::Generating,
                source,
            })?;

        info!("Pipeline stage: {}", PipelineStage::Parsing);
        let jobs = parse_digest(&raw_digest);
        info!("Parsed {} jobs from digest", jobs.len());

        if let Some(delivery) = &self.delivery {
            info!("Pipeline stage: {}", PipelineStage::Delivering);
            delivery
                .mailer
                .send_digest(&delivery.recipient, DIGEST_SUBJECT, &raw_digest)
                .await
                .map_err(|source| PipelineError::Collaborator {
                    stage: PipelineStage::Delivering,
                    source,
                })?;
        }

        info!("Pipeline stage: {}", PipelineStage::Persisting);
        seen.extend(new_links.iter().map(|link| canonical_url(link).to_string()));
        // The digest is still returned; the caller decides how to surface the failure.
        let persist_error = match self.seen_store.save(&seen) {
            Ok(()) => None,
            Err(e) => {
                error!("Failed to persist seen jobs: {e:#}");
                Some(format!("{} failed: {e:#}", PipelineStage::Persisting))
            }
        };

        Ok(RunOutcome::Digest(Digest {
            raw_digest,
            jobs,
            persist_error,
        }))
    }
}
