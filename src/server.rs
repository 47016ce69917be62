//! HTTP API server.
//!
//! Exposes role-filtered search and grounded chat as a JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | Grounded answer with source documents |
//! | `POST` | `/search` | Role-filtered document search |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses use one JSON shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `upstream_error` (502), `internal` (500).
//! Upstream failures (search, chat model, translator) never crash the process.
//!
//! # Roles
//!
//! The external identity provider is out of scope; callers pass their role
//! set in the request body. An absent or empty role set yields a deny-all
//! filter, so unauthenticated requests see nothing rather than everything.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::chat::ChatService;
use crate::config::Config;
use crate::models::{SearchHit, UserContext};
use crate::search::SearchService;

/// Results-per-query ceiling for the search endpoint.
const MAX_TOP: usize = 50;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    search: Arc<SearchService>,
    chat: Arc<ChatService>,
}

/// Start the API server on `[server].bind`.
///
/// All service clients are constructed up front, so missing configuration or
/// credentials fail here rather than on the first request.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState {
        search: Arc::new(SearchService::new(config)?),
        chat: Arc::new(ChatService::new(config)?),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/chat", post(handle_chat))
        .route("/search", post(handle_search))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("API server listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn upstream_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream_error".to_string(),
        message: message.into(),
    }
}

/// Map a service error to the client response: validation failures become
/// 400s, everything else is an upstream failure surfaced as a 502.
fn classify_error(operation: &str, err: anyhow::Error) -> AppError {
    let msg = err.to_string();
    if msg.contains("must not be empty") || msg.contains("no translator endpoint") {
        bad_request(msg)
    } else {
        error!(operation, error = %msg, "request failed");
        upstream_error(format!("{}: {}", operation, msg))
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    top: Option<usize>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
    count: u64,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let top = request.top.map(|t| t.clamp(1, MAX_TOP));

    let user = UserContext::new(request.roles, request.user_id);
    let (results, count) = state
        .search
        .search_documents(&request.query, top, &user)
        .await
        .map_err(|e| classify_error("search", e))?;

    Ok(Json(SearchResponse { results, count }))
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    user_id: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    source_documents: Vec<SearchHit>,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.message.trim().is_empty() {
        return Err(bad_request("message must not be empty"));
    }

    let user = UserContext::new(request.roles, request.user_id);
    let answer = state
        .chat
        .answer(&request.message, &request.language, &user)
        .await
        .map_err(|e| classify_error("chat", e))?;

    Ok(Json(ChatResponse {
        response: answer.response,
        source_documents: answer.source_documents,
    }))
}
