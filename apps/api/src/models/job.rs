use serde::{Deserialize, Serialize};

/// One job posting recovered from a digest, with its summary and tailored resume.
///
/// Records have no identity beyond their position in the parsed list. Any field may be empty
/// when the digest text was only partially structured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub location: String,
    /// Posting URLs in the order the digest listed them. Duplicates are preserved.
    pub links: Vec<String>,
    pub summary: String,
    /// Tailored resume body.
    pub resume: String,
}
