use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::{EntityTrait, QueryOrder};

use crate::models::invoice::{self, Entity as Invoice};
use crate::services::document_service::{self, InvoiceDraft};
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

pub async fn list_invoices(State(state): State<AppState>) -> impl IntoResponse {
    match Invoice::find()
        .order_by_desc(invoice::Column::IssueDate)
        .all(state.db())
        .await
    {
        Ok(invoices) => Json(serde_json::json!({
            "invoices": invoices,
            "total": invoices.len()
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
            .into_response(),
    }
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match document_service::get_invoice(state.db(), &id).await {
        Ok(invoice) => Json(serde_json::json!({ "invoice": invoice })).into_response(),
        Err(e) => service_error(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/invoices",
    responses(
        (status = 201, description = "Invoice created with its line items")
    )
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(draft): Json<InvoiceDraft>,
) -> impl IntoResponse {
    match document_service::create_invoice(state.db(), state.settings.as_ref(), draft).await {
        Ok(invoice) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "invoice": invoice,
                "message": "Invoice created successfully"
            })),
        )
            .into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<InvoiceDraft>,
) -> impl IntoResponse {
    match document_service::update_invoice(state.db(), &id, draft).await {
        Ok(invoice) => Json(serde_json::json!({
            "invoice": invoice,
            "message": "Invoice updated successfully"
        }))
        .into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match document_service::delete_invoice(state.db(), &id).await {
        Ok(()) => {
            Json(serde_json::json!({"message": "Invoice deleted successfully"})).into_response()
        }
        Err(e) => service_error(e),
    }
}
