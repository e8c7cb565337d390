use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{DiscountType, InvoiceStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub number: String,
    // Client snapshot, copied at creation time rather than referenced
    pub client_name: String,
    pub client_address: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub status: InvoiceStatus,
    pub issue_date: String,
    pub due_date: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub tax_rate: f64,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoice_line_item::Entity")]
    LineItems,
    #[sea_orm(has_many = "super::invoice_custom_field::Entity")]
    CustomFields,
}

impl Related<super::invoice_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl Related<super::invoice_custom_field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomFields.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
