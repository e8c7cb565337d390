use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::category::{self, Entity as Category};
use crate::models::category_custom_field::{self, Entity as CategoryCustomField};
use crate::models::CustomFieldKind;

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomFieldDto {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub kind: CustomFieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl From<category_custom_field::Model> for CustomFieldDto {
    fn from(model: category_custom_field::Model) -> Self {
        let options: Option<Vec<String>> = model
            .options
            .map(|s| serde_json::from_str(&s).unwrap_or_default());
        Self {
            id: Some(model.id),
            name: model.name,
            kind: model.kind,
            required: model.required,
            options,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDto>,
}

async fn insert_custom_fields(
    db: &DatabaseConnection,
    category_id: &str,
    fields: Vec<CustomFieldDto>,
    now: &str,
) -> Result<usize, sea_orm::DbErr> {
    let mut count = 0;
    for field in fields {
        let options = field
            .options
            .map(|opts| serde_json::to_string(&opts).unwrap_or_default());
        let row = category_custom_field::ActiveModel {
            id: Set(field.id.unwrap_or_else(|| Uuid::new_v4().to_string())),
            category_id: Set(category_id.to_owned()),
            name: Set(field.name),
            kind: Set(field.kind),
            required: Set(field.required),
            options: Set(options),
            created_at: Set(now.to_owned()),
        };
        row.insert(db).await?;
        count += 1;
    }
    Ok(count)
}

// List categories with their custom fields
pub async fn list_categories(State(db): State<DatabaseConnection>) -> impl IntoResponse {
    let categories = match Category::find()
        .order_by_asc(category::Column::Name)
        .find_with_related(CategoryCustomField)
        .all(&db)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Database error: {}", e)})),
            )
                .into_response();
        }
    };

    let payload: Vec<serde_json::Value> = categories
        .into_iter()
        .map(|(cat, fields)| {
            serde_json::json!({
                "id": cat.id,
                "name": cat.name,
                "description": cat.description,
                "custom_fields": fields.into_iter().map(CustomFieldDto::from).collect::<Vec<_>>(),
                "created_at": cat.created_at,
                "updated_at": cat.updated_at,
            })
        })
        .collect();

    Json(serde_json::json!({
        "categories": payload,
        "total": payload.len()
    }))
    .into_response()
}

pub async fn get_category(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match Category::find_by_id(id.as_str()).one(&db).await {
        Ok(Some(cat)) => {
            let fields = CategoryCustomField::find()
                .filter(category_custom_field::Column::CategoryId.eq(&cat.id))
                .all(&db)
                .await
                .unwrap_or_default();
            Json(serde_json::json!({
                "category": cat,
                "custom_fields": fields.into_iter().map(CustomFieldDto::from).collect::<Vec<_>>()
            }))
            .into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Category not found"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Database error: {}", e)})),
        )
            .into_response(),
    }
}

pub async fn create_category(
    State(db): State<DatabaseConnection>,
    Json(dto): Json<CategoryDto>,
) -> impl IntoResponse {
    let now = chrono::Utc::now().to_rfc3339();
    let id = Uuid::new_v4().to_string();

    let new_category = category::ActiveModel {
        id: Set(id.clone()),
        name: Set(dto.name),
        description: Set(dto.description),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
    };

    match new_category.insert(&db).await {
        Ok(model) => {
            if let Err(e) = insert_custom_fields(&db, &id, dto.custom_fields, &now).await {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": format!("Failed to create custom fields: {}", e)})),
                )
                    .into_response();
            }
            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "category": model,
                    "message": "Category created successfully"
                })),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": format!("Failed to create category: {}", e)})),
        )
            .into_response(),
    }
}

pub async fn update_category(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
    Json(dto): Json<CategoryDto>,
) -> impl IntoResponse {
    let category = Category::find_by_id(id.as_str()).one(&db).await.unwrap_or(None);

    if let Some(category) = category {
        let now = chrono::Utc::now().to_rfc3339();
        let mut active: category::ActiveModel = category.into();
        active.name = Set(dto.name);
        active.description = Set(dto.description);
        active.updated_at = Set(now.clone());

        match active.update(&db).await {
            Ok(model) => {
                // Custom fields are replaced wholesale on update
                let cleared = CategoryCustomField::delete_many()
                    .filter(category_custom_field::Column::CategoryId.eq(&id))
                    .exec(&db)
                    .await;
                if let Err(e) = cleared {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({"error": format!("Database error: {}", e)})),
                    )
                        .into_response();
                }
                if let Err(e) = insert_custom_fields(&db, &id, dto.custom_fields, &now).await {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({"error": format!("Failed to update custom fields: {}", e)})),
                    )
                        .into_response();
                }
                Json(serde_json::json!({
                    "category": model,
                    "message": "Category updated successfully"
                }))
                .into_response()
            }
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Failed to update category: {}", e)})),
            )
                .into_response(),
        }
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Category not found"})),
        )
            .into_response()
    }
}

// Deleting a category cascades to its custom fields
pub async fn delete_category(
    State(db): State<DatabaseConnection>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let category = Category::find_by_id(id.as_str()).one(&db).await.unwrap_or(None);

    if let Some(category) = category {
        let cleared = CategoryCustomField::delete_many()
            .filter(category_custom_field::Column::CategoryId.eq(&id))
            .exec(&db)
            .await;
        if let Err(e) = cleared {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Database error: {}", e)})),
            )
                .into_response();
        }
        match category.delete(&db).await {
            Ok(_) => Json(serde_json::json!({"message": "Category deleted successfully"}))
                .into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": format!("Failed to delete category: {}", e)})),
            )
                .into_response(),
        }
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Category not found"})),
        )
            .into_response()
    }
}
