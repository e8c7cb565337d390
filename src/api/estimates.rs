use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::{EntityTrait, QueryOrder};

use crate::models::estimate::{self, Entity as Estimate};
use crate::services::document_service::{self, EstimateDraft};
use crate::services::ServiceError;
use crate::state::AppState;

fn service_error(e: ServiceError) -> axum::response::Response {
    let (status, message) = match &e {
        ServiceError::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
        ServiceError::SkuConflict(_) => (StatusCode::CONFLICT, e.to_string()),
        ServiceError::InvalidState(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        ServiceError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub async fn list_estimates(State(state): State<AppState>) -> impl IntoResponse {
    match Estimate::find()
        .order_by_desc(estimate::Column::IssueDate)
        .all(state.db())
        .await
    {
        Ok(estimates) => Json(serde_json::json!({
            "estimates": estimates,
            "total": estimates.len()
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
            .into_response(),
    }
}

pub async fn get_estimate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match document_service::get_estimate(state.db(), &id).await {
        Ok(estimate) => Json(serde_json::json!({ "estimate": estimate })).into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn create_estimate(
    State(state): State<AppState>,
    Json(draft): Json<EstimateDraft>,
) -> impl IntoResponse {
    match document_service::create_estimate(state.db(), state.settings.as_ref(), draft).await {
        Ok(estimate) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "estimate": estimate,
                "message": "Estimate created successfully"
            })),
        )
            .into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn update_estimate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<EstimateDraft>,
) -> impl IntoResponse {
    match document_service::update_estimate(state.db(), &id, draft).await {
        Ok(estimate) => Json(serde_json::json!({
            "estimate": estimate,
            "message": "Estimate updated successfully"
        }))
        .into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn delete_estimate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match document_service::delete_estimate(state.db(), &id).await {
        Ok(()) => {
            Json(serde_json::json!({"message": "Estimate deleted successfully"})).into_response()
        }
        Err(e) => service_error(e),
    }
}
