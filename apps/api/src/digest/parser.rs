//! Digest Parser — recovers structured job records from the delimiter-based digest text.
//!
//! The digest is free-form model output, so parsing is best-effort: malformed input yields
//! records with empty fields or skipped chunks, never an error.
//!
//! Two phases:
//! 1. `tokenize` splits the text on the block rule and classifies each non-empty chunk.
//! 2. `pair_chunks` folds every JOB chunk with the chunk immediately after it (its detail chunk).

use crate::digest::link::LINK_SEPARATOR;
use crate::models::job::JobRecord;

/// Rule line separating digest blocks: 40 `=` characters.
pub const BLOCK_RULE: &str = "========================================";

const JOB_PREFIX: &str = "JOB:";
const LINKS_LABEL: &str = "links:";
const SUMMARY_LABEL: &str = "JOB SUMMARY:";
const RESUME_LABEL: &str = "TAILORED RESUME:";
const TITLE_COMPANY_SEPARATOR: &str = " at ";

/// A trimmed, non-empty slice of digest text between two block rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// Starts with `JOB:` (case-insensitive).
    Job(&'a str),
    Other(&'a str),
}

impl<'a> Chunk<'a> {
    pub fn text(&self) -> &'a str {
        match *self {
            Chunk::Job(text) | Chunk::Other(text) => text,
        }
    }
}

/// A JOB chunk and the detail chunk that followed it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobBlock<'a> {
    pub header: &'a str,
    pub detail: Option<&'a str>,
}

/// Parses raw digest text into job records, in digest order.
pub fn parse_digest(raw_text: &str) -> Vec<JobRecord> {
    pair_chunks(&tokenize(raw_text))
        .into_iter()
        .map(build_record)
        .collect()
}

/// Splits on the block rule, dropping chunks that are empty after trimming.
pub fn tokenize(raw_text: &str) -> Vec<Chunk<'_>> {
    raw_text
        .split(BLOCK_RULE)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            if starts_with_ignore_case(chunk, JOB_PREFIX) {
                Chunk::Job(chunk)
            } else {
                Chunk::Other(chunk)
            }
        })
        .collect()
}

/// Pairs each JOB chunk with the chunk directly after it.
///
/// The following chunk is consumed whatever its kind. Non-JOB chunks that are not consumed as a
/// detail chunk are ignored.
pub fn pair_chunks<'a>(chunks: &[Chunk<'a>]) -> Vec<JobBlock<'a>> {
    let mut blocks = Vec::new();
    let mut iter = chunks.iter();

    while let Some(chunk) = iter.next() {
        if let Chunk::Job(header) = *chunk {
            blocks.push(JobBlock {
                header,
                detail: iter.next().map(Chunk::text),
            });
        }
    }

    blocks
}

fn build_record(block: JobBlock<'_>) -> JobRecord {
    let mut record = JobRecord::default();

    let first_line = block.header.lines().next().unwrap_or_default();
    parse_job_line(first_line, &mut record);
    record.links = parse_links(block.header);

    if let Some(detail) = block.detail {
        let (summary, resume) = parse_detail(detail);
        record.summary = summary;
        record.resume = resume;
    }

    record
}

/// Parses `JOB: <title> at <company> — <location>`. Unmatched parts stay empty.
fn parse_job_line(line: &str, record: &mut JobRecord) {
    let Some((before_location, location)) = line.rsplit_once(LINK_SEPARATOR) else {
        return;
    };
    record.location = location.trim().to_string();

    let before_location = before_location.trim_start();
    if !starts_with_ignore_case(before_location, JOB_PREFIX) {
        return;
    }
    let rest = before_location[JOB_PREFIX.len()..].trim();

    if let Some((title, company)) = rest.rsplit_once(TITLE_COMPANY_SEPARATOR) {
        record.title = title.trim().to_string();
        record.company = company.trim().to_string();
    }
}

/// Collects `- <url>` lines following a `Links:` line. Once entered, links mode stays on for the
/// rest of the chunk; dash lines without `http` and non-dash lines are skipped.
fn parse_links(chunk: &str) -> Vec<String> {
    let mut links = Vec::new();
    let mut in_links = false;

    for line in chunk.lines() {
        let line = line.trim();
        if line.eq_ignore_ascii_case(LINKS_LABEL) {
            in_links = true;
            continue;
        }
        if !in_links {
            continue;
        }
        if let Some(item) = line.strip_prefix('-') {
            let item = item.trim();
            if item.contains("http") {
                links.push(item.to_string());
            }
        }
    }

    links
}

/// Returns `(summary, resume)` from a detail chunk.
fn parse_detail(chunk: &str) -> (String, String) {
    // ASCII uppercasing keeps byte offsets aligned with `chunk`.
    let upper = chunk.to_ascii_uppercase();

    if let Some(summary_at) = upper.find(SUMMARY_LABEL) {
        let summary_start = summary_at + SUMMARY_LABEL.len();
        return match upper[summary_at..].find(RESUME_LABEL) {
            Some(offset) => {
                let resume_at = summary_at + offset;
                (
                    chunk[summary_start..resume_at].trim().to_string(),
                    chunk[resume_at + RESUME_LABEL.len()..].trim().to_string(),
                )
            }
            None => (chunk[summary_start..].trim().to_string(), String::new()),
        };
    }

    if upper.contains(RESUME_LABEL) {
        // The first line is taken to be the label itself and is dropped whole.
        let resume = chunk
            .split_once('\n')
            .map(|(_, body)| body.trim().to_string())
            .unwrap_or_default();
        return (String::new(), resume);
    }

    (String::new(), String::new())
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
