use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::client::{self, Entity as Client};

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientDto {
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

impl From<client::Model> for ClientDto {
    fn from(model: client::Model) -> Self {
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

pub async fn list_clients(State(db): State<DatabaseConnection>) -> impl IntoResponse {
    match Client::find()
        .order_by_asc(client::Column::Name)
        .all(&db)
        .await
    {
        Ok(clients) => {
            let dtos: Vec<ClientDto> = clients.into_iter().map(ClientDto::from).collect();
            Json(serde_json::json!({
                "clients": dtos,
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

pub async fn get_client(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match Client::find_by_id(id.as_str()).one(&db).await {
        Ok(Some(model)) => Json(serde_json::json!({"client": ClientDto::from(model)})).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Client not found"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
            .into_response(),
    }
}

pub async fn create_client(
    State(db): State<DatabaseConnection>,
    Json(dto): Json<ClientDto>,
) -> impl IntoResponse {
    let now = chrono::Utc::now().to_rfc3339();

    let new_client = client::ActiveModel {
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

    match new_client.insert(&db).await {
        Ok(model) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "client": ClientDto::from(model),
                "message": "Client created successfully"
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Failed to create client: {}", e)})),
        )
            .into_response(),
    }
}

pub async fn update_client(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
    Json(dto): Json<ClientDto>,
) -> impl IntoResponse {
    let existing = Client::find_by_id(id.as_str()).one(&db).await.unwrap_or(None);

    if let Some(model) = existing {
        let mut active: client::ActiveModel = model.into();
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
                "client": ClientDto::from(model),
                "message": "Client updated successfully"
            }))
            .into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Failed to update client: {}", e)})),
            )
                .into_response(),
        }
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Client not found"})),
        )
            .into_response()
    }
}

pub async fn delete_client(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let existing = Client::find_by_id(id.as_str()).one(&db).await.unwrap_or(None);

    if let Some(model) = existing {
        match model.delete(&db).await {
            Ok(_) => {
                Json(serde_json::json!({"message": "Client deleted successfully"})).into_response()
            }
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Failed to delete client: {}", e)})),
            )
                .into_response(),
        }
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Client not found"})),
        )
            .into_response()
    }
}
