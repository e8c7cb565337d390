use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::BTreeMap;

use crate::state::AppState;

pub async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    match state.settings.all().await {
        Ok(settings) => Json(serde_json::json!({ "settings": settings })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(entries): Json<BTreeMap<String, String>>,
) -> impl IntoResponse {
    for (key, value) in &entries {
        if let Err(e) = state.settings.set(key, value).await {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response();
        }
    }
    Json(serde_json::json!({
        "updated": entries.len(),
        "message": "Settings updated successfully"
    }))
    .into_response()
}
