//! Axum route handlers for fetching digests and downloading tailored resumes.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::models::job::JobRecord;
use crate::pipeline::{into_parts, RunOutcome};
use crate::resume::download_filename;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Either `{success: true, jobs, raw_digest, warning?}` or `{success: false, error}`.
/// `warning` is set when the jobs could not be marked seen; a later alert for them is not deduplicated.
#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<Vec<JobRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadResumeRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    pub resume: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/fetch
///
/// Runs the pipeline once. No-work outcomes and failures both come back as
/// `success: false` with a message.
pub async fn handle_fetch(State(state): State<AppState>) -> Json<FetchResponse> {
    let result = state.pipeline.run().await;
    let warning = match &result {
        Err(e) => {
            warn!("Pipeline run failed: {e}");
            None
        }
        Ok(RunOutcome::Digest(digest)) => digest.persist_error.clone(),
        Ok(RunOutcome::NoWork(_)) => None,
    };

    let response = match into_parts(result) {
        (_, _, Some(error)) => FetchResponse {
            success: false,
            jobs: None,
            raw_digest: None,
            error: Some(error),
            warning: None,
        },
        (raw_digest, jobs, None) => FetchResponse {
            success: true,
            jobs: Some(jobs),
            raw_digest: Some(raw_digest.unwrap_or_default()),
            error: None,
            warning,
        },
    };

    Json(response)
}

/// POST /api/download-resume
///
/// Returns the tailored resume as a text attachment named after the job.
pub async fn handle_download_resume(
    request: Option<Json<DownloadResumeRequest>>,
) -> Result<Response, AppError> {
    let Some(Json(request)) = request else {
        return Err(AppError::Validation("Missing resume content".to_string()));
    };
    let Some(resume) = request.resume else {
        return Err(AppError::Validation("Missing resume content".to_string()));
    };

    let filename = download_filename(&request.title, &request.company, &request.location);
    let disposition = HeaderValue::from_str(&content_disposition(&filename))
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        resume,
    )
        .into_response())
}

/// `attachment` disposition with an ASCII `filename` fallback and the UTF-8 name in `filename*`.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"' && *c != '\\')
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::digest::generator::DigestGenerator;
    use crate::digest::parser::BLOCK_RULE;
    use crate::mail::LinkSource;
    use crate::pipeline::Pipeline;
    use crate::resume::{ResumeError, ResumeProvider};
    use crate::routes::build_router;
    use crate::seen_store::SeenJobStore;

    struct OneLink;

    #[async_trait]
    impl LinkSource for OneLink {
        async fn collect_links(&self) -> Result<Vec<String>> {
            Ok(vec!["Rust Dev — http://jobs.example.com/1".to_string()])
        }
    }

    struct Resume(Option<&'static str>);

    impl ResumeProvider for Resume {
        fn load_master_resume(&self) -> Result<String, ResumeError> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| ResumeError::NotFound("master_resume.txt".to_string()))
        }
    }

    struct CannedDigest;

    #[async_trait]
    impl DigestGenerator for CannedDigest {
        async fn generate(&self, _resume: &str, _job_links_text: &str) -> Result<String> {
            Ok(format!(
                "{BLOCK_RULE}\nJOB: Rust Dev at Acme — Remote\nLinks:\n- http://jobs.example.com/1\n{BLOCK_RULE}\nJOB SUMMARY:\nFit.\nTAILORED RESUME:\nJane\n{BLOCK_RULE}"
            ))
        }
    }

    fn app(dir: &tempfile::TempDir, resume: Option<&'static str>) -> axum::Router {
        app_with_store(SeenJobStore::new(dir.path().join("seen_jobs.json")), resume)
    }

    fn app_with_store(store: SeenJobStore, resume: Option<&'static str>) -> axum::Router {
        let pipeline = Pipeline::new(
            Arc::new(OneLink),
            Arc::new(Resume(resume)),
            Arc::new(CannedDigest),
            store,
        );
        build_router(AppState {
            pipeline: Arc::new(pipeline),
        })
    }

    async fn post(app: axum::Router, uri: &str, body: Option<&str>) -> Response {
        let builder = Request::builder().method("POST").uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir, Some("r"))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_fetch_returns_jobs_then_no_new_jobs() {
        let dir = tempfile::tempdir().unwrap();

        let first = body_json(post(app(&dir, Some("Jane")), "/api/fetch", None).await).await;
        assert_eq!(first["success"], true);
        assert_eq!(first["jobs"][0]["title"], "Rust Dev");
        assert_eq!(first["jobs"][0]["company"], "Acme");
        assert_eq!(first["jobs"][0]["links"][0], "http://jobs.example.com/1");
        assert_eq!(first["jobs"][0]["resume"], "Jane");
        assert!(first["raw_digest"].as_str().unwrap().contains("JOB: Rust Dev"));
        assert!(first.get("error").is_none());
        assert!(first.get("warning").is_none());

        let second = body_json(post(app(&dir, Some("Jane")), "/api/fetch", None).await).await;
        assert_eq!(second["success"], false);
        assert_eq!(second["error"], "No new jobs (all already seen).");
        assert!(second.get("jobs").is_none());
    }

    #[tokio::test]
    async fn test_fetch_warns_when_jobs_cannot_be_marked_seen() {
        let dir = tempfile::tempdir().unwrap();
        let store = SeenJobStore::new(dir.path().join("missing").join("seen_jobs.json"));

        let body = body_json(post(app_with_store(store, Some("Jane")), "/api/fetch", None).await).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["jobs"][0]["title"], "Rust Dev");
        assert!(body["warning"]
            .as_str()
            .unwrap()
            .starts_with("persisting seen jobs failed: "));
    }

    #[tokio::test]
    async fn test_fetch_reports_missing_resume() {
        let dir = tempfile::tempdir().unwrap();
        let response = post(app(&dir, None), "/api/fetch", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Master resume not found."));
    }

    #[tokio::test]
    async fn test_download_resume_returns_named_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let response = post(
            app(&dir, Some("r")),
            "/api/download-resume",
            Some(r#"{"title":"Rust Dev","company":"Acme","location":"Remote","resume":"Jane Doe\nRust"}"#),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"Rust Dev at Acme  Remote resume.txt\""));
        assert!(disposition.contains("filename*=UTF-8''Rust%20Dev%20at%20Acme%20%E2%80%94%20Remote%20resume.txt"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Jane Doe\nRust");
    }

    #[tokio::test]
    async fn test_download_resume_without_metadata_uses_fallback_name() {
        let dir = tempfile::tempdir().unwrap();
        let response = post(
            app(&dir, Some("r")),
            "/api/download-resume",
            Some(r#"{"resume":"text"}"#),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("filename=\"resume resume.txt\""));
    }

    #[tokio::test]
    async fn test_download_resume_requires_resume() {
        let dir = tempfile::tempdir().unwrap();

        let no_field = post(
            app(&dir, Some("r")),
            "/api/download-resume",
            Some(r#"{"title":"Dev"}"#),
        )
        .await;
        assert_eq!(no_field.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(no_field).await["error"]["message"],
            "Missing resume content"
        );

        let no_body = post(app(&dir, Some("r")), "/api/download-resume", None).await;
        assert_eq!(no_body.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_content_disposition_is_ascii_safe() {
        let value = content_disposition("Café — Dev resume.txt");
        assert!(value.is_ascii());
        assert!(value.starts_with("attachment; filename=\"Caf  Dev resume.txt\""));
    }
}
