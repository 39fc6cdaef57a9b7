//! Master resume loading and download naming for tailored resumes.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use thiserror::Error;

/// Characters stripped from download filenames.
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const FALLBACK_STEM: &str = "resume";

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("Master resume not found. Create '{0}' in the project folder.")]
    NotFound(String),

    #[error("Failed to read master resume '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Supplies the master resume text sent along with every digest request.
pub trait ResumeProvider: Send + Sync {
    fn load_master_resume(&self) -> Result<String, ResumeError>;
}

/// Reads the master resume from a text file on every call.
#[derive(Debug, Clone)]
pub struct FileResumeProvider {
    path: PathBuf,
}

impl FileResumeProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResumeProvider for FileResumeProvider {
    fn load_master_resume(&self) -> Result<String, ResumeError> {
        let display = self.path.display().to_string();
        fs::read_to_string(&self.path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ResumeError::NotFound(display),
            _ => ResumeError::Io {
                path: display,
                source,
            },
        })
    }
}

/// Strips `<>:"/\|?*` and surrounding whitespace, falling back to `"resume"` if nothing is left.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !INVALID_FILENAME_CHARS.contains(c))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Builds `"<Title> at <Company> — <Location> resume.txt"` from whichever parts are non-empty.
pub fn download_filename(title: &str, company: &str, location: &str) -> String {
    let mut parts = Vec::new();
    if !title.is_empty() {
        parts.push(title.to_string());
    }
    if !company.is_empty() {
        parts.push(format!("at {company}"));
    }
    if !location.is_empty() {
        parts.push(format!("— {location}"));
    }

    let base = if parts.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        parts.join(" ")
    };
    format!("{} resume.txt", sanitize_filename(&base))
}
