//! API routes for bereand.
//!
//! Two surfaces: the verse form (GET/POST `/`, result rendered inline)
//! and the JSON endpoint (`POST /process_verse`, result delivered by
//! email). Validation failures answer 400 with a structured body before
//! the orchestrator is ever invoked; chain or mail failures answer 500
//! with the cause logged server-side.

use crate::mailer::RESULT_SUBJECT;
use crate::orchestrator::research_crew;
use crate::server::AppState;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use berean_common::{
    ErrorResponse, HealthResponse, MessageResponse, NumberOrText, ProcessVerseRequest,
    ScriptureReference,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

type AppStateArc = Arc<AppState>;

pub fn verse_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/", get(index).post(submit_form))
        .route("/process_verse", post(process_verse))
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

/// Run the full research chain for one reference, under the configured
/// wall-clock budget.
async fn run_research(state: &AppState, reference: &ScriptureReference) -> Result<String> {
    let crew = research_crew(reference, &state.config);
    let budget = Duration::from_secs(state.config.chain.total_budget_secs);
    let artifact = tokio::time::timeout(budget, crew.kickoff(state.runner.as_ref()))
        .await
        .context("research chain exceeded its wall-clock budget")??;
    Ok(artifact)
}

// ============================================================================
// Form routes
// ============================================================================

const INDEX_PAGE: &str = r#"<!doctype html>
<html>
<head><title>Berean - Verse Research</title></head>
<body>
  <h1>Berean verse research</h1>
  <form method="post" action="/">
    <label for="verse">Verse or passage:</label>
    <input type="text" id="verse" name="verse" placeholder="John 3:16" required>
    <button type="submit">Research</button>
  </form>
</body>
</html>
"#;

#[derive(Debug, Deserialize)]
struct VerseForm {
    verse: Option<String>,
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn result_page(reference: &ScriptureReference, artifact: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head><title>Berean - {reference}</title></head>\n<body>\n\
         <h1>Research for {reference}</h1>\n<pre>{artifact}</pre>\n\
         <p><a href=\"/\">Research another verse</a></p>\n</body>\n</html>\n",
        reference = escape_html(&reference.to_string()),
        artifact = escape_html(artifact),
    )
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn submit_form(State(state): State<AppStateArc>, Form(form): Form<VerseForm>) -> Response {
    let Some(verse) = form.verse.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<p>No verse provided.</p>".to_string()),
        )
            .into_response();
    };

    let reference = ScriptureReference::free_text(verse);
    info!("[Q]  Form request: {}", reference);

    match run_research(&state, &reference).await {
        Ok(artifact) => Html(result_page(&reference, &artifact)).into_response(),
        Err(e) => {
            error!("[E]  Research chain failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<p>Failed to process the verse.</p>".to_string()),
            )
                .into_response()
        }
    }
}

// ============================================================================
// JSON endpoint
// ============================================================================

const SUCCESS_MESSAGE: &str = "Email sent successfully with the results.";

/// Check all four required fields are present and non-empty.
fn validate(
    req: &ProcessVerseRequest,
) -> Result<(String, NumberOrText, NumberOrText, String), String> {
    let book = req.book.as_deref().map(str::trim).filter(|v| !v.is_empty());
    let email = req.email.as_deref().map(str::trim).filter(|v| !v.is_empty());

    let mut missing = Vec::new();
    if book.is_none() {
        missing.push("book");
    }
    if req.chapter.is_none() {
        missing.push("chapter");
    }
    if req.verse.is_none() {
        missing.push("verse");
    }
    if email.is_none() {
        missing.push("email");
    }

    match (book, req.chapter.clone(), req.verse.clone(), email) {
        (Some(book), Some(chapter), Some(verse), Some(email)) => {
            Ok((book.to_string(), chapter, verse, email.to_string()))
        }
        _ => Err(format!("Missing required fields: {}", missing.join(", "))),
    }
}

async fn process_verse(
    State(state): State<AppStateArc>,
    Json(req): Json<ProcessVerseRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (book, chapter, verse, email) = validate(&req).map_err(|error| {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
    })?;

    let reference = ScriptureReference::from_parts(&book, &chapter, &verse);
    info!("[Q]  Processing: {} for {}", reference, email);

    let artifact = run_research(&state, &reference).await.map_err(|e| {
        error!("[E]  Research chain failed: {:#}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to process the verse.".to_string(),
            }),
        )
    })?;

    state
        .mailer
        .send(&email, RESULT_SUBJECT, &artifact)
        .await
        .map_err(|e| {
            error!("[E]  Email dispatch failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to send the result email.".to_string(),
                }),
            )
        })?;

    info!("[A]  Done: {} emailed to {}", reference, email);
    Ok(Json(MessageResponse {
        message: SUCCESS_MESSAGE.to_string(),
    }))
}

// ============================================================================
// Health route
// ============================================================================

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::mailer::Mailer;
    use crate::orchestrator::AgentRunner;
    use crate::server;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use berean_common::{AgentDescriptor, TaskDescriptor};
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Runner that returns a fixed artifact and counts invocations.
    struct ScriptedRunner {
        output: &'static str,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ScriptedRunner {
        fn ok(output: &'static str) -> Self {
            Self {
                output,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                output: "",
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AgentRunner for ScriptedRunner {
        async fn run(
            &self,
            _agents: &[AgentDescriptor],
            _task: &TaskDescriptor,
            _context: Option<&str>,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("model backend unavailable");
            }
            Ok(self.output.to_string())
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn app_with(
        runner: Arc<ScriptedRunner>,
        mailer: Arc<RecordingMailer>,
    ) -> axum::Router {
        let state = Arc::new(AppState::new(Config::default(), runner, mailer));
        server::router(state)
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/process_verse")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_process_verse_end_to_end() {
        let runner = Arc::new(ScriptedRunner::ok("scripted final artifact"));
        let mailer = Arc::new(RecordingMailer::default());
        let app = app_with(runner.clone(), mailer.clone());

        let response = app
            .oneshot(json_request(
                r#"{"book":"John","chapter":"3","verse":"16","email":"x@y.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], SUCCESS_MESSAGE);

        // Three tasks ran, exactly one email went out with the artifact.
        assert_eq!(runner.calls.load(Ordering::SeqCst), 3);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (to, subject, body) = &sent[0];
        assert_eq!(to, "x@y.com");
        assert_eq!(subject, RESULT_SUBJECT);
        assert!(body.contains("scripted final artifact"));
    }

    #[tokio::test]
    async fn test_process_verse_accepts_integer_fields() {
        let runner = Arc::new(ScriptedRunner::ok("artifact"));
        let mailer = Arc::new(RecordingMailer::default());
        let app = app_with(runner, mailer.clone());

        let response = app
            .oneshot(json_request(
                r#"{"book":"John","chapter":3,"verse":16,"email":"x@y.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_process_verse_missing_field_is_400_without_orchestration() {
        let runner = Arc::new(ScriptedRunner::ok("artifact"));
        let mailer = Arc::new(RecordingMailer::default());
        let app = app_with(runner.clone(), mailer.clone());

        let response = app
            .oneshot(json_request(r#"{"book":"John","chapter":"3","verse":"16"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("email"));

        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_verse_chain_failure_is_500_structured() {
        let runner = Arc::new(ScriptedRunner::failing());
        let mailer = Arc::new(RecordingMailer::default());
        let app = app_with(runner, mailer.clone());

        let response = app
            .oneshot(json_request(
                r#"{"book":"John","chapter":"3","verse":"16","email":"x@y.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to process the verse.");
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let app = app_with(
            Arc::new(ScriptedRunner::ok("artifact")),
            Arc::new(RecordingMailer::default()),
        );

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("name=\"verse\""));
        // The form carries only the verse; email delivery belongs to the
        // JSON endpoint.
        assert!(!page.contains("name=\"email\""));
    }

    #[tokio::test]
    async fn test_form_submission_renders_artifact_inline() {
        let app = app_with(
            Arc::new(ScriptedRunner::ok("an <inline> artifact")),
            Arc::new(RecordingMailer::default()),
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("verse=John+3%3A16"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("John 3:16"));
        // Artifact is escaped, not injected
        assert!(page.contains("an &lt;inline&gt; artifact"));
    }

    #[tokio::test]
    async fn test_form_submission_without_verse_is_400() {
        let app = app_with(
            Arc::new(ScriptedRunner::ok("artifact")),
            Arc::new(RecordingMailer::default()),
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("verse="))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = app_with(
            Arc::new(ScriptedRunner::ok("artifact")),
            Arc::new(RecordingMailer::default()),
        );

        let response = app
            .oneshot(Request::builder().uri("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[test]
    fn test_validate_reports_all_missing_fields() {
        let req: ProcessVerseRequest = serde_json::from_str(r#"{"book":"  "}"#).unwrap();
        let err = validate(&req).unwrap_err();
        assert!(err.contains("book"));
        assert!(err.contains("chapter"));
        assert!(err.contains("verse"));
        assert!(err.contains("email"));
    }
}
