use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::supplier::{self, Entity as Supplier};

#[derive(Debug, Serialize, Deserialize)]
pub struct SupplierDto {
    pub id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub notes: Option<String>,
}

impl From<supplier::Model> for SupplierDto {
    fn from(model: supplier::Model) -> Self {
        Self {
            id: Some(model.id),
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            city: model.city,
            postal_code: model.postal_code,
            country: model.country,
            notes: model.notes,
        }
    }
}

pub async fn list_suppliers(State(db): State<DatabaseConnection>) -> impl IntoResponse {
    match Supplier::find()
        .order_by_asc(supplier::Column::Name)
        .all(&db)
        .await
    {
        Ok(suppliers) => {
            let dtos: Vec<SupplierDto> = suppliers.into_iter().map(SupplierDto::from).collect();
            Json(serde_json::json!({
                "suppliers": dtos,
                "total": dtos.len()
            }))
            .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
            .into_response(),
    }
}

pub async fn get_supplier(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match Supplier::find_by_id(id.as_str()).one(&db).await {
        Ok(Some(model)) => {
            Json(serde_json::json!({"supplier": SupplierDto::from(model)})).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Supplier not found"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
            .into_response(),
    }
}

pub async fn create_supplier(
    State(db): State<DatabaseConnection>,
    Json(dto): Json<SupplierDto>,
) -> impl IntoResponse {
    let now = chrono::Utc::now().to_rfc3339();

    let new_supplier = supplier::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(dto.name),
        email: Set(dto.email),
        phone: Set(dto.phone),
        address: Set(dto.address),
        city: Set(dto.city),
        postal_code: Set(dto.postal_code),
        country: Set(dto.country),
        notes: Set(dto.notes),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };

    match new_supplier.insert(&db).await {
        Ok(model) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "supplier": SupplierDto::from(model),
                "message": "Supplier created successfully"
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Failed to create supplier: {}", e)})),
        )
            .into_response(),
    }
}

pub async fn update_supplier(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
    Json(dto): Json<SupplierDto>,
) -> impl IntoResponse {
    let existing = Supplier::find_by_id(id.as_str()).one(&db).await.unwrap_or(None);

    if let Some(model) = existing {
        let mut active: supplier::ActiveModel = model.into();
        active.name = Set(dto.name);
        active.email = Set(dto.email);
        active.phone = Set(dto.phone);
        active.address = Set(dto.address);
        active.city = Set(dto.city);
        active.postal_code = Set(dto.postal_code);
        active.country = Set(dto.country);
        active.notes = Set(dto.notes);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        match active.update(&db).await {
            Ok(model) => Json(serde_json::json!({
                "supplier": SupplierDto::from(model),
                "message": "Supplier updated successfully"
            }))
            .into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Failed to update supplier: {}", e)})),
            )
                .into_response(),
        }
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Supplier not found"})),
        )
            .into_response()
    }
}

pub async fn delete_supplier(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let existing = Supplier::find_by_id(id.as_str()).one(&db).await.unwrap_or(None);

    if let Some(model) = existing {
        match model.delete(&db).await {
            Ok(_) => Json(serde_json::json!({"message": "Supplier deleted successfully"}))
                .into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Failed to delete supplier: {}", e)})),
            )
                .into_response(),
        }
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Supplier not found"})),
        )
            .into_response()
    }
}
