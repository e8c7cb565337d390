//! Item service - stock items with a unique SKU business key.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use super::ServiceError;
use crate::models::enums::MeasurementUnit;
use crate::models::item::{self, Entity as Item};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ItemDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub sku: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub buy_price: f64,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub min_stock_level: i32,
    #[serde(default)]
    pub measurement_unit: MeasurementUnit,
    #[serde(default)]
    pub tax_rate: f64,
    pub barcode: Option<String>,
}

/// SKU uniqueness is a business rule, not a side effect of the store's
/// unique index: we check first so callers get a typed conflict error.
pub async fn ensure_unique_sku<C: ConnectionTrait>(
    conn: &C,
    sku: &str,
    exclude_id: Option<&str>,
) -> Result<(), ServiceError> {
    let mut query = Item::find().filter(item::Column::Sku.eq(sku));
    if let Some(id) = exclude_id {
        query = query.filter(item::Column::Id.ne(id));
    }
    if query.count(conn).await? > 0 {
        return Err(ServiceError::SkuConflict(sku.to_owned()));
    }
    Ok(())
}

pub async fn create_item(db: &DatabaseConnection, draft: ItemDraft) -> Result<item::Model, ServiceError> {
    if draft.name.trim().is_empty() {
        return Err(ServiceError::InvalidState("item name must not be empty".to_string()));
    }
    if draft.sku.trim().is_empty() {
        return Err(ServiceError::InvalidState("item SKU must not be empty".to_string()));
    }
    ensure_unique_sku(db, &draft.sku, None).await?;

    let now = Utc::now().to_rfc3339();
    let new_item = item::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(draft.name),
        description: Set(draft.description),
        category: Set(draft.category),
        sku: Set(draft.sku),
        price: Set(draft.price),
        buy_price: Set(draft.buy_price),
        stock_quantity: Set(draft.stock_quantity),
        min_stock_level: Set(draft.min_stock_level),
        measurement_unit: Set(draft.measurement_unit),
        tax_rate: Set(draft.tax_rate),
        barcode: Set(draft.barcode),
        image_data: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        inventory_added_at: Set(now),
    };

    Ok(new_item.insert(db).await?)
}

pub async fn update_item(
    db: &DatabaseConnection,
    id: &str,
    draft: ItemDraft,
) -> Result<item::Model, ServiceError> {
    let existing = Item::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    ensure_unique_sku(db, &draft.sku, Some(id)).await?;

    let mut active: item::ActiveModel = existing.into();
    active.name = Set(draft.name);
    active.description = Set(draft.description);
    active.category = Set(draft.category);
    active.sku = Set(draft.sku);
    active.price = Set(draft.price);
    active.buy_price = Set(draft.buy_price);
    active.stock_quantity = Set(draft.stock_quantity);
    active.min_stock_level = Set(draft.min_stock_level);
    active.measurement_unit = Set(draft.measurement_unit);
    active.tax_rate = Set(draft.tax_rate);
    active.barcode = Set(draft.barcode);
    active.updated_at = Set(Utc::now().to_rfc3339());

    Ok(active.update(db).await?)
}

pub async fn delete_item(db: &DatabaseConnection, id: &str) -> Result<(), ServiceError> {
    let existing = Item::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;
    existing.delete(db).await?;
    Ok(())
}

/// Items at or below their minimum stock level.
pub async fn list_low_stock(db: &DatabaseConnection) -> Result<Vec<item::Model>, ServiceError> {
    let items = Item::find()
        .filter(Expr::col(item::Column::StockQuantity).lte(Expr::col(item::Column::MinStockLevel)))
        .order_by_asc(item::Column::Name)
        .all(db)
        .await?;
    Ok(items)
}
