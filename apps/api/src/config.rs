use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_ALERT_SENDER: &str = "googlealerts-noreply@google.com";
const DEFAULT_SEEN_JOBS_FILE: &str = "seen_jobs.json";
const DEFAULT_MASTER_RESUME_FILE: &str = "master_resume.txt";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// OAuth bearer token for the Gmail API. Refreshing it is handled outside this service.
    pub gmail_access_token: String,
    /// Only messages whose `From` header contains this address are mined for links.
    pub alert_sender: String,
    pub seen_jobs_path: PathBuf,
    pub master_resume_path: PathBuf,
    /// Where `run --email` sends the digest.
    pub digest_recipient: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            gmail_access_token: require_env("GMAIL_ACCESS_TOKEN")?,
            alert_sender: env_or("ALERT_SENDER", DEFAULT_ALERT_SENDER),
            seen_jobs_path: env_or("SEEN_JOBS_FILE", DEFAULT_SEEN_JOBS_FILE).into(),
            master_resume_path: env_or("MASTER_RESUME_FILE", DEFAULT_MASTER_RESUME_FILE).into(),
            digest_recipient: std::env::var("DIGEST_RECIPIENT")
                .ok()
                .filter(|to| !to.trim().is_empty()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
