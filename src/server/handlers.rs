//! Request handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::templates;
use super::{AppState, SESSION_HEADER};
use crate::assistant::{AssistantError, UploadResponse};

impl IntoResponse for AssistantError {
    fn into_response(self) -> Response {
        let status = match &self {
            AssistantError::SessionNotFound(_) | AssistantError::FileNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AssistantError::EmptyPrompt => StatusCode::BAD_REQUEST,
            AssistantError::Busy => StatusCode::CONFLICT,
            AssistantError::DeleteRefused(_)
            | AssistantError::OpenAi(_)
            | AssistantError::Scrape(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn requested_session(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Session id for a request that changes state, creating a session when the
/// header is missing or unknown.
async fn session_id(state: &AppState, headers: &HeaderMap) -> String {
    state
        .assistant
        .sessions()
        .resolve(requested_session(headers))
        .await
}

/// Session id for a read-only request. Unknown sessions are not created.
async fn existing_session(state: &AppState, headers: &HeaderMap) -> Option<String> {
    state
        .assistant
        .sessions()
        .existing(requested_session(headers))
        .await
}

/// Attach the session header to a response.
fn with_session(session_id: String, response: impl IntoResponse) -> Response {
    ([(SESSION_HEADER, session_id)], response).into_response()
}

/// Assistant page.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Html(templates::assistant_page(&state.settings))
}

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Upload a document (multipart field `file`).
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let sid = session_id(&state, &headers).await;

    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((filename, bytes.to_vec())),
                    Err(e) => {
                        warn!("Could not read upload '{}': {}", filename, e);
                        return with_session(sid, (e.status(), Json(invalid_file())));
                    }
                }
                break;
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart upload: {}", e);
                return with_session(sid, (e.status(), Json(invalid_file())));
            }
        }
    }

    let Some((filename, bytes)) = upload else {
        return with_session(sid, (StatusCode::BAD_REQUEST, Json(invalid_file())));
    };

    info!("Upload '{}' for session {}", filename, sid);
    let response = state.assistant.upload(&sid, &filename, bytes).await;
    with_session(sid, Json(response))
}

fn invalid_file() -> UploadResponse {
    UploadResponse::Error {
        message: "Archivo inválido.".to_string(),
    }
}

pub async fn list_files(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(sid) = existing_session(&state, &headers).await else {
        return Json(json!([])).into_response();
    };
    match state.assistant.files(&sid).await {
        Ok(files) => with_session(sid, Json(files)),
        Err(e) => with_session(sid, e),
    }
}

pub async fn delete_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(file_id): Path<String>,
) -> Response {
    let Some(sid) = existing_session(&state, &headers).await else {
        return AssistantError::FileNotFound(file_id).into_response();
    };
    match state.assistant.delete_file(&sid, &file_id).await {
        Ok(filename) => with_session(
            sid,
            Json(json!({ "status": "deleted", "file_id": file_id, "filename": filename })),
        ),
        Err(e) => with_session(sid, e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: String,
}

/// Run one assistant turn.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Response {
    if request.prompt.trim().is_empty() {
        return AssistantError::EmptyPrompt.into_response();
    }
    let sid = session_id(&state, &headers).await;
    match state.assistant.submit(&sid, &request.prompt).await {
        Ok(turn) => with_session(
            sid,
            Json(json!({
                "reply": turn.reply,
                "thread_id": turn.thread_id,
                "messages": turn.messages,
            })),
        ),
        Err(e) => with_session(sid, e),
    }
}

pub async fn list_messages(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(sid) = existing_session(&state, &headers).await else {
        return Json(json!([])).into_response();
    };
    match state.assistant.messages(&sid).await {
        Ok(messages) => with_session(sid, Json(messages)),
        Err(e) => with_session(sid, e),
    }
}

/// Scrape recent bills into the session.
pub async fn scrape_bills(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let sid = session_id(&state, &headers).await;
    match state.assistant.scrape_bills(&sid).await {
        Ok(bills) => with_session(sid, Json(bills)),
        Err(e) => with_session(sid, e),
    }
}

pub async fn list_bills(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(sid) = existing_session(&state, &headers).await else {
        return Json(json!([])).into_response();
    };
    match state.assistant.bills(&sid).await {
        Ok(bills) => with_session(sid, Json(bills)),
        Err(e) => with_session(sid, e),
    }
}
