use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::handlers;
use crate::session::display_text;
use crate::state::AppState;
use crate::translate::Language;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // WebSocket
        .route("/client-ws", get(websocket_handler))

        // Health check
        .route("/api/health", get(health_check))

        // REST API routes
        .route("/api/languages", get(get_languages))
        .route("/api/translate", post(translate))
        .route("/api/credential", get(get_credential).put(set_credential))
}

async fn websocket_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    State(state): State<AppState>,
) -> axum::response::Response {
    crate::websocket::websocket_handler(ws, State(state)).await
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "credential_configured": state.credentials.is_configured(),
    }))
}

async fn get_languages() -> Json<Value> {
    Json(json!(handlers::language_entries()))
}

#[derive(Debug, Deserialize)]
struct TranslatePayload {
    text: String,
    #[serde(default = "auto_source")]
    source_lang: Language,
    target_lang: Language,
}

fn auto_source() -> Language {
    Language::Auto
}

async fn translate(
    State(state): State<AppState>,
    Json(payload): Json<TranslatePayload>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if payload.target_lang.is_auto() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "target_lang cannot be auto-detect"})),
        ));
    }
    if payload.text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "text is required"})),
        ));
    }

    let translator = state.translator().await;
    let result = translator
        .translate(&payload.text, payload.source_lang, payload.target_lang)
        .await;

    let mut body = serde_json::to_value(&result).map_err(|e| {
        error!("Failed to encode translation result: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
    })?;
    body["display"] = json!(display_text(&result));
    Ok(Json(body))
}

async fn get_credential(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "configured": state.credentials.is_configured(),
    }))
}

#[derive(Debug, Deserialize)]
struct CredentialPayload {
    api_key: String,
}

async fn set_credential(
    State(state): State<AppState>,
    Json(payload): Json<CredentialPayload>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state.replace_credential(payload.api_key).await.map_err(|e| {
        error!("Failed to update credential: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
    })?;
    Ok(Json(json!({
        "configured": state.credentials.is_configured(),
    })))
}
