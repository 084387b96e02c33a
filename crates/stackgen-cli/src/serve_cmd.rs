//! HTTP front door: one orchestrator run per `POST /ask`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use stackgen_core::error::OrchestratorError;
use stackgen_core::orchestrator::Orchestrator;
use stackgen_core::task::{BackendId, GenerationMode, TaskRequest};

use crate::config::split_list;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        let message = format!("{err:#}");
        if err.is_client_error() {
            return Self::bad_request(message);
        }
        match err {
            OrchestratorError::Verdict(_)
            | OrchestratorError::Validation(_)
            | OrchestratorError::StackIdentification(_) => Self::bad_gateway(message),
            _ => Self::internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AskParams {
    pub task_description: String,
    #[serde(default)]
    pub generation_mode: Option<String>,
    /// Comma-separated subset of configured backends.
    #[serde(default)]
    pub backends: Option<String>,
}

impl AskParams {
    /// A `backends` parameter that names no backend is rejected rather than
    /// fanning out to nothing.
    fn into_request(self) -> Result<TaskRequest, AppError> {
        let mode = self
            .generation_mode
            .as_deref()
            .map(GenerationMode::from)
            .unwrap_or_default();
        let request = TaskRequest::new(self.task_description, mode);
        let Some(list) = self.backends else {
            return Ok(request);
        };
        let names = split_list(&list);
        if names.is_empty() {
            return Err(AppError::bad_request(
                "backends must name at least one configured backend",
            ));
        }
        Ok(request.with_backends(names.into_iter().map(BackendId::new).collect()))
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/docs") }))
        .route("/docs", get(docs))
        .route("/ask", post(ask))
        .layer(CorsLayer::permissive())
        .with_state(orchestrator)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(orchestrator: Orchestrator, bind: &str, port: u16) -> Result<()> {
    let app = build_router(Arc::new(orchestrator));
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("stackgen serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("stackgen serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn ask(
    State(orchestrator): State<Arc<Orchestrator>>,
    Query(params): Query<AskParams>,
) -> Result<Response, AppError> {
    let request = params.into_request()?;
    let state = orchestrator.run(&request).await.map_err(|e| {
        tracing::warn!(error = %e, "request failed");
        AppError::from(e)
    })?;
    Ok(Json(state).into_response())
}

async fn docs(State(orchestrator): State<Arc<Orchestrator>>) -> Html<String> {
    let backends = orchestrator.registry().list().join(", ");
    let limit = orchestrator.config().stack_limit;
    Html(format!(
        "<!DOCTYPE html>\
<html><head><title>stackgen</title></head><body>\
<h1>stackgen</h1>\
<p>Generates code or dependency manifests for up to {limit} technology stacks \
per task, once per backend.</p>\
<h2>POST /ask</h2>\
<table><tr><th>Query parameter</th><th>Meaning</th></tr>\
<tr><td>task_description</td><td>Free-text description of the task (required)</td></tr>\
<tr><td>generation_mode</td><td><code>code</code> or <code>dependencies</code> (default)</td></tr>\
<tr><td>backends</td><td>Comma-separated subset of: {backends}</td></tr>\
</table>\
<p>Response: <code>{{task_description, generation_mode, tech_stacks, is_valid, \
results: [{{backend_id, tech_stack, artifacts}}]}}</code></p>\
</body></html>"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use stackgen_core::orchestrator::Orchestrator;
    use stackgen_test_utils::{Behavior, ScriptedGenerator, orchestrator, registry_of};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn default_orchestrator() -> Orchestrator {
        orchestrator(
            ScriptedGenerator::new("primary"),
            registry_of(&["openai", "deepseek"]),
            2,
        )
    }

    async fn send(orchestrator: Orchestrator, method: &str, uri: &str) -> axum::response::Response {
        let app = super::build_router(Arc::new(orchestrator));
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn ask_returns_full_state() {
        let response = send(
            default_orchestrator(),
            "POST",
            "/ask?task_description=build%20a%20todo%20api",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["task_description"], "build a todo api");
        assert_eq!(json["generation_mode"], "dependencies");
        assert_eq!(json["is_valid"], true);
        assert_eq!(json["tech_stacks"].as_array().unwrap().len(), 2);

        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 4);
        for entry in results {
            assert!(entry["backend_id"].is_string());
            assert!(entry["tech_stack"].is_string());
            assert_eq!(entry["artifacts"].as_array().unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn ask_honors_code_mode() {
        let response = send(
            default_orchestrator(),
            "POST",
            "/ask?task_description=cli&generation_mode=code",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["generation_mode"], "code");
        let block = &json["results"][0]["artifacts"][0]["blocks"][0];
        assert!(block.get("filename").is_none());
    }

    #[tokio::test]
    async fn ask_with_backend_subset() {
        let response = send(
            default_orchestrator(),
            "POST",
            "/ask?task_description=cli&backends=deepseek",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r["backend_id"] == "deepseek"));
    }

    #[tokio::test]
    async fn rejected_task_is_a_normal_response() {
        let primary = ScriptedGenerator::new("primary").with_verdict("False");
        let orch = orchestrator(primary, registry_of(&["openai"]), 2);

        let response = send(orch, "POST", "/ask?task_description=tell%20me%20a%20joke").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["is_valid"], false);
        assert!(json["tech_stacks"].as_array().unwrap().is_empty());
        assert!(json["results"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unparseable_verdict_is_bad_gateway() {
        let primary = ScriptedGenerator::new("primary").with_verdict("maybe");
        let orch = orchestrator(primary, registry_of(&["openai"]), 2);

        let response = send(orch, "POST", "/ask?task_description=x").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("maybe"));
    }

    #[tokio::test]
    async fn identification_failure_is_bad_gateway() {
        let primary = ScriptedGenerator::new("primary").with_identification(Behavior::Fail);
        let orch = orchestrator(primary, registry_of(&["openai"]), 2);

        let response = send(orch, "POST", "/ask?task_description=x").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn unknown_backend_is_bad_request() {
        let response = send(
            default_orchestrator(),
            "POST",
            "/ask?task_description=x&backends=openai,nope",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn empty_backend_subset_is_bad_request() {
        for uri in ["/ask?task_description=x&backends=", "/ask?task_description=x&backends=%20,%20"] {
            let orch = orchestrator(ScriptedGenerator::new("primary"), registry_of(&["openai"]), 2);

            let response = send(orch, "POST", uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");
            assert!(body_json(response).await["error"].as_str().unwrap().contains("backends"));
        }
    }

    #[tokio::test]
    async fn missing_description_is_rejected() {
        let response = send(default_orchestrator(), "POST", "/ask").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ask_requires_post() {
        let response = send(default_orchestrator(), "GET", "/ask?task_description=x").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn root_redirects_to_docs() {
        let response = send(default_orchestrator(), "GET", "/").await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/docs");
    }

    #[tokio::test]
    async fn docs_lists_backends() {
        let response = send(default_orchestrator(), "GET", "/docs").await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("openai, deepseek"));
        assert!(html.contains("POST /ask"));
    }
}
