use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::MeasurementUnit;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String, // category name, not a foreign key
    #[sea_orm(unique)]
    pub sku: String,
    pub price: f64,
    pub buy_price: f64,
    pub stock_quantity: i32,
    pub min_stock_level: i32,
    pub measurement_unit: MeasurementUnit,
    pub tax_rate: f64,
    pub barcode: Option<String>,
    pub image_data: Option<Vec<u8>>,
    pub created_at: String,
    pub updated_at: String,
    pub inventory_added_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
