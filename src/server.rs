//! JSON/text HTTP API over the project registry.
//!
//! This is the serving boundary consumed by the browser dashboard and by
//! agent-side bridges: it exposes the full scan snapshot, the plain-text
//! agent context, project management, and the chat endpoints.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/api/scan` | Full scan snapshot for a project |
//! | `GET`  | `/api/rescan` | Fresh scan, replacing the stored snapshot |
//! | `GET`  | `/api/agent-context` | Plain-text risk map |
//! | `GET`  | `/api/project-root` | Project root path |
//! | `GET`  | `/api/projects` | Loaded projects |
//! | `GET`  | `/api/recent-projects` | Recently opened project paths |
//! | `GET`  | `/api/chat/history` | Chat transcript for a project |
//! | `POST` | `/api/load-project` | Register and scan a project |
//! | `POST` | `/api/projects/activate` | Switch the current project |
//! | `POST` | `/api/projects/unload` | Drop a loaded project |
//! | `POST` | `/api/read-file` | Read one file inside a project |
//! | `POST` | `/api/glob-files` | Glob for files inside a project |
//! | `POST` | `/api/chat` | Ask the chat collaborator a question |
//! | `POST` | `/api/chat/clear` | Clear a project's chat history |
//! | `POST` | `/api/chat/config` | Update and persist chat settings |
//!
//! Endpoints taking a project accept an optional `project_id` (query
//! parameter on GET, body field on POST) and fall back to the current
//! project.
//!
//! # Error Contract
//!
//! All error responses share one JSON shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "Missing path parameter" } }
//! ```
//!
//! Error codes: `bad_request` (400), `forbidden` (403), `not_found` (404),
//! `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the dashboard is a
//! browser client served from a different origin during development.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use globset::Glob;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use walkdir::WalkDir;

use crate::chat;
use crate::config::{self, ChatConfig};
use crate::models::ScanResult;
use crate::registry::{self, ChatMessage, ProjectRegistry};
use crate::scan;

/// Shared application state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<Mutex<ProjectRegistry>>,
    chat_config: Arc<Mutex<ChatConfig>>,
    config_path: Arc<PathBuf>,
    history_path: Arc<PathBuf>,
}

/// Start the HTTP server on `bind_addr`.
///
/// `registry` may already hold a preloaded project (the `carto serve <root>`
/// case). Runs until the process is terminated.
pub async fn run_server(
    bind_addr: &str,
    registry: ProjectRegistry,
    chat_config: ChatConfig,
    config_path: PathBuf,
    history_path: PathBuf,
) -> anyhow::Result<()> {
    let state = AppState {
        registry: Arc::new(Mutex::new(registry)),
        chat_config: Arc::new(Mutex::new(chat_config)),
        config_path: Arc::new(config_path),
        history_path: Arc::new(history_path),
    };

    let app = router(state);

    println!("Cartographer API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router; separated from [`run_server`] so tests can drive the
/// API without binding a socket.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/scan", get(handle_scan))
        .route("/api/rescan", get(handle_rescan))
        .route("/api/agent-context", get(handle_agent_context))
        .route("/api/project-root", get(handle_project_root))
        .route("/api/projects", get(handle_projects))
        .route("/api/recent-projects", get(handle_recent_projects))
        .route("/api/chat/history", get(handle_chat_history))
        .route("/api/load-project", post(handle_load_project))
        .route("/api/projects/activate", post(handle_activate))
        .route("/api/projects/unload", post(handle_unload))
        .route("/api/read-file", post(handle_read_file))
        .route("/api/glob-files", post(handle_glob_files))
        .route("/api/chat", post(handle_chat))
        .route("/api/chat/clear", post(handle_chat_clear))
        .route("/api/chat/config", post(handle_chat_config))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

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

fn forbidden(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::FORBIDDEN,
        code: "forbidden".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
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

// ============ Project snapshot endpoints ============

#[derive(Deserialize)]
struct ProjectQuery {
    project_id: Option<String>,
}

async fn handle_scan(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<ScanResult>, AppError> {
    let registry = state.registry.lock().await;
    registry
        .get(query.project_id.as_deref())
        .map(|p| Json(p.scan.clone()))
        .ok_or_else(|| not_found("no project loaded"))
}

/// Run the blocking scan pipeline off the async runtime.
async fn run_scan(root: PathBuf, id: String) -> Result<ScanResult, AppError> {
    tokio::task::spawn_blocking(move || scan::scan_project(&root, Some(id.as_str())))
        .await
        .map_err(|e| internal(format!("scan task failed: {}", e)))?
        .map_err(|e| bad_request(e.to_string()))
}

async fn handle_rescan(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<ScanResult>, AppError> {
    let (id, root) = {
        let registry = state.registry.lock().await;
        registry
            .root_of(query.project_id.as_deref())
            .ok_or_else(|| not_found("no project loaded"))?
    };

    let result = run_scan(root, id.clone()).await?;

    let mut registry = state.registry.lock().await;
    if !registry.replace_scan(&id, result.clone()) {
        return Err(not_found("project was unloaded during rescan"));
    }
    Ok(Json(result))
}

async fn handle_agent_context(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<String, AppError> {
    let registry = state.registry.lock().await;
    registry
        .get(query.project_id.as_deref())
        .map(|p| p.scan.agent_context.clone())
        .ok_or_else(|| not_found("no project loaded"))
}

async fn handle_project_root(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let registry = state.registry.lock().await;
    registry
        .get(query.project_id.as_deref())
        .map(|p| Json(serde_json::json!({ "project_root": p.root.to_string_lossy() })))
        .ok_or_else(|| not_found("no project loaded"))
}

#[derive(Serialize)]
struct ProjectInfo {
    id: String,
    name: String,
    root: String,
    health: u32,
    file_count: usize,
    is_current: bool,
}

async fn handle_projects(State(state): State<AppState>) -> Json<serde_json::Value> {
    let registry = state.registry.lock().await;
    let current = registry.current_id().map(str::to_string);
    let projects: Vec<ProjectInfo> = registry
        .projects()
        .iter()
        .map(|p| ProjectInfo {
            id: p.id.clone(),
            name: p.name.clone(),
            root: p.root.to_string_lossy().to_string(),
            health: p.scan.metadata.health_score,
            file_count: p.scan.nodes.len(),
            is_current: current.as_deref() == Some(p.id.as_str()),
        })
        .collect();
    Json(serde_json::json!({ "projects": projects }))
}

async fn handle_recent_projects(State(state): State<AppState>) -> Json<serde_json::Value> {
    let projects = registry::recent_projects(&state.history_path);
    Json(serde_json::json!({ "projects": projects }))
}

// ============ Project management ============

#[derive(Deserialize)]
struct LoadProjectRequest {
    path: String,
}

async fn handle_load_project(
    State(state): State<AppState>,
    Json(body): Json<LoadProjectRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    // Paths pasted from a shell may arrive wrapped in quotes.
    let path = body
        .path
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    if path.is_empty() {
        return Err(bad_request("Missing path parameter"));
    }

    let registry_handle = state.registry.clone();
    let loaded = tokio::task::spawn_blocking(move || {
        let mut registry = registry_handle.blocking_lock();
        registry
            .load_project(Path::new(&path))
            .map(|p| (p.id.clone(), p.name.clone(), p.root.clone(), p.scan.clone()))
    })
    .await
    .map_err(|e| internal(format!("load task failed: {}", e)))?
    .map_err(|e| bad_request(e.to_string()))?;

    let (project_id, project_name, root, scan_data) = loaded;
    let _ = registry::add_recent_project(&state.history_path, &root);

    Ok(Json(serde_json::json!({
        "project_id": project_id,
        "project_name": project_name,
        "scan_data": scan_data,
    })))
}

#[derive(Deserialize)]
struct ProjectIdRequest {
    project_id: String,
}

async fn handle_activate(
    State(state): State<AppState>,
    Json(body): Json<ProjectIdRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut registry = state.registry.lock().await;
    if registry.activate(&body.project_id) {
        Ok(Json(serde_json::json!({
            "success": true,
            "project_id": body.project_id,
        })))
    } else {
        Err(not_found("Project not found"))
    }
}

async fn handle_unload(
    State(state): State<AppState>,
    Json(body): Json<ProjectIdRequest>,
) -> Json<serde_json::Value> {
    let mut registry = state.registry.lock().await;
    registry.unload(&body.project_id);
    Json(serde_json::json!({ "success": true }))
}

// ============ File access ============

#[derive(Deserialize)]
struct ReadFileRequest {
    project_id: Option<String>,
    path: String,
}

async fn handle_read_file(
    State(state): State<AppState>,
    Json(body): Json<ReadFileRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.path.is_empty() {
        return Err(bad_request("Missing path parameter"));
    }

    let root = {
        let registry = state.registry.lock().await;
        registry
            .get(body.project_id.as_deref())
            .map(|p| p.root.clone())
            .ok_or_else(|| bad_request("No project loaded"))?
    };

    // The project root is canonicalized at load time, so a resolved path
    // must stay under it.
    let resolved = root
        .join(&body.path)
        .canonicalize()
        .map_err(|_| not_found("File not found"))?;
    if !resolved.starts_with(&root) {
        return Err(forbidden("Access denied: path outside project"));
    }

    let content = std::fs::read(&resolved)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|e| internal(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "path": body.path,
        "content": content,
    })))
}

#[derive(Deserialize)]
struct GlobFilesRequest {
    project_id: Option<String>,
    pattern: String,
}

async fn handle_glob_files(
    State(state): State<AppState>,
    Json(body): Json<GlobFilesRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.pattern.is_empty() {
        return Err(bad_request("Missing pattern parameter"));
    }

    let root = {
        let registry = state.registry.lock().await;
        registry
            .get(body.project_id.as_deref())
            .map(|p| p.root.clone())
            .ok_or_else(|| bad_request("No project loaded"))?
    };

    let matcher = Glob::new(&body.pattern)
        .map_err(|e| bad_request(format!("Invalid pattern: {}", e)))?
        .compile_matcher();

    let matches = tokio::task::spawn_blocking(move || {
        let mut matches = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            let rel_str = relative.to_string_lossy().to_string();
            if matcher.is_match(&rel_str) {
                matches.push(rel_str);
            }
        }
        matches
    })
    .await
    .map_err(|e| internal(format!("glob task failed: {}", e)))?;

    Ok(Json(serde_json::json!({
        "pattern": body.pattern,
        "matches": matches,
    })))
}

// ============ Chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    model: Option<String>,
    #[serde(default)]
    include_files: Vec<String>,
    project_id: Option<String>,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let message = body.message.trim().to_string();
    if message.is_empty() {
        return Err(bad_request("Missing message parameter"));
    }

    let (context, history, project_id) = {
        let registry = state.registry.lock().await;
        let project = registry
            .get(body.project_id.as_deref())
            .ok_or_else(|| bad_request("No project loaded"))?;
        (
            chat::build_context(&project.scan, &message, &body.include_files),
            project.chat_history.clone(),
            project.id.clone(),
        )
    };

    let chat_config = state.chat_config.lock().await.clone();
    let model = body.model.unwrap_or_else(|| chat_config.model.clone());

    let reply = chat::chat_completion(&chat_config, &model, &message, &context, &history)
        .await
        .map_err(|e| {
            let text = e.to_string();
            if text.contains("DEEPSEEK_API_KEY") {
                bad_request(text)
            } else {
                internal(text)
            }
        })?;

    {
        let mut registry = state.registry.lock().await;
        if let Some(project) = registry.get_mut(Some(project_id.as_str())) {
            project.chat_history.push(ChatMessage {
                role: "user".to_string(),
                content: message,
            });
            project.chat_history.push(ChatMessage {
                role: "assistant".to_string(),
                content: reply.clone(),
            });
        }
    }

    Ok(Json(serde_json::json!({
        "response": reply,
        "model": model,
        "context_size": context.chars().count(),
    })))
}

async fn handle_chat_history(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let registry = state.registry.lock().await;
    registry
        .get(query.project_id.as_deref())
        .map(|p| Json(serde_json::json!({ "messages": p.chat_history })))
        .ok_or_else(|| not_found("no project loaded"))
}

#[derive(Deserialize)]
struct ChatClearRequest {
    project_id: Option<String>,
}

async fn handle_chat_clear(
    State(state): State<AppState>,
    Json(body): Json<ChatClearRequest>,
) -> Json<serde_json::Value> {
    let mut registry = state.registry.lock().await;
    if let Some(project) = registry.get_mut(body.project_id.as_deref()) {
        project.chat_history.clear();
    }
    Json(serde_json::json!({ "success": true }))
}

#[derive(Deserialize)]
struct ChatConfigRequest {
    api_key: String,
    model: Option<String>,
}

async fn handle_chat_config(
    State(state): State<AppState>,
    Json(body): Json<ChatConfigRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let api_key = body.api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(bad_request("API key cannot be empty"));
    }

    let mut chat_config = state.chat_config.lock().await;
    chat_config.api_key = Some(api_key);
    if let Some(model) = body.model.filter(|m| !m.trim().is_empty()) {
        chat_config.model = model;
    }

    let saved = config::save_config(&state.config_path, &chat_config).is_ok();

    Ok(Json(serde_json::json!({
        "success": true,
        "model": chat_config.model,
        "api_key_set": true,
        "saved_to_file": saved,
    })))
}
