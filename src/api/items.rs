use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use crate::models::item::{self, Entity as Item};
use crate::services::item_service::{self, ItemDraft};
use crate::services::ServiceError;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ItemsQuery {
    pub category: Option<String>,
    pub sku: Option<String>,
}

fn service_error(e: ServiceError) -> axum::response::Response {
    let (status, message) = match &e {
        ServiceError::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
        ServiceError::SkuConflict(_) => (StatusCode::CONFLICT, e.to_string()),
        ServiceError::InvalidState(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        ServiceError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[utoipa::path(
    get,
    path = "/api/items",
    responses(
        (status = 200, description = "List all items")
    )
)]
pub async fn list_items(
    State(db): State<DatabaseConnection>,
    Query(params): Query<ItemsQuery>,
) -> impl IntoResponse {
    let mut query = Item::find().order_by_asc(item::Column::Name);

    if let Some(category) = params.category {
        query = query.filter(item::Column::Category.eq(category));
    }
    if let Some(sku) = params.sku {
        query = query.filter(item::Column::Sku.eq(sku));
    }

    match query.all(&db).await {
        Ok(items) => Json(serde_json::json!({
            "items": items,
            "total": items.len()
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
            .into_response(),
    }
}

pub async fn get_item(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match Item::find_by_id(id.as_str()).one(&db).await {
        Ok(Some(item)) => Json(serde_json::json!({ "item": item })).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Item not found"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
            .into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/items",
    responses(
        (status = 201, description = "Item created"),
        (status = 409, description = "SKU already in use")
    )
)]
pub async fn create_item(
    State(db): State<DatabaseConnection>,
    Json(draft): Json<ItemDraft>,
) -> impl IntoResponse {
    match item_service::create_item(&db, draft).await {
        Ok(item) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "item": item,
                "message": "Item created successfully"
            })),
        )
            .into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn update_item(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
    Json(draft): Json<ItemDraft>,
) -> impl IntoResponse {
    match item_service::update_item(&db, &id, draft).await {
        Ok(item) => Json(serde_json::json!({
            "item": item,
            "message": "Item updated successfully"
        }))
        .into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn delete_item(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match item_service::delete_item(&db, &id).await {
        Ok(()) => Json(serde_json::json!({"message": "Item deleted successfully"})).into_response(),
        Err(e) => service_error(e),
    }
}

pub async fn list_low_stock(State(db): State<DatabaseConnection>) -> impl IntoResponse {
    match item_service::list_low_stock(&db).await {
        Ok(items) => Json(serde_json::json!({
            "items": items,
            "total": items.len()
        }))
        .into_response(),
        Err(e) => service_error(e),
    }
}
