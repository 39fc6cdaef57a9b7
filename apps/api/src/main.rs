mod config;
mod digest;
mod errors;
mod llm_client;
mod mail;
mod models;
mod pipeline;
mod resume;
mod routes;
mod seen_store;
mod state;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::digest::generator::LlmDigestGenerator;
use crate::llm_client::LlmClient;
use crate::mail::gmail::GmailClient;
use crate::pipeline::{Pipeline, PipelineError, RunOutcome};
use crate::resume::FileResumeProvider;
use crate::routes::build_router;
use crate::seen_store::SeenJobStore;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "jobdigest", version, about = "Job alert digests with tailored resumes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Run the pipeline once and print the digest.
    Run {
        /// Also email the digest to DIGEST_RECIPIENT before marking its jobs seen.
        #[arg(long)]
        email: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobdigest v{}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            serve(&config, Arc::new(build_pipeline(&config, false)?)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { email } => Ok(run_once(&build_pipeline(&config, email)?).await),
    }
}

/// Wires the pipeline's collaborators. Each client is created once for the process.
fn build_pipeline(config: &Config, email: bool) -> Result<Pipeline> {
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let gmail = Arc::new(GmailClient::new(
        config.gmail_access_token.clone(),
        config.alert_sender.clone(),
    ));
    info!("Gmail client initialized (sender: {})", config.alert_sender);

    let pipeline = Pipeline::new(
        gmail.clone(),
        Arc::new(FileResumeProvider::new(&config.master_resume_path)),
        Arc::new(LlmDigestGenerator::new(llm)),
        SeenJobStore::new(&config.seen_jobs_path),
    );
    if !email {
        return Ok(pipeline);
    }

    let recipient = config
        .digest_recipient
        .clone()
        .context("DIGEST_RECIPIENT must be set to email the digest")?;
    info!("Digest will be emailed to {recipient}");
    Ok(pipeline.with_mailer(gmail, recipient))
}

async fn serve(config: &Config, pipeline: Arc<Pipeline>) -> Result<()> {
    let app = build_router(AppState { pipeline })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// One-shot run for cron-style use. A missing resume, a collaborator failure or an unsaved
/// seen-store is a non-zero exit; "nothing new" is a normal outcome.
async fn run_once(pipeline: &Pipeline) -> ExitCode {
    match pipeline.run().await {
        Ok(RunOutcome::Digest(digest)) => {
            println!("{}", digest.raw_digest);
            info!("Digest generated with {} jobs", digest.jobs.len());
            match digest.persist_error {
                Some(error) => {
                    eprintln!("{error}");
                    ExitCode::FAILURE
                }
                None => ExitCode::SUCCESS,
            }
        }
        Ok(RunOutcome::NoWork(reason)) => {
            println!("{reason}");
            ExitCode::SUCCESS
        }
        Err(e @ PipelineError::MissingResource(_)) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
