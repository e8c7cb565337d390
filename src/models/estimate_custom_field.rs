use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "estimate_custom_fields")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    // Back-reference to the owning estimate; nullified, not cascaded, on delete
    pub estimate_id: Option<String>,
    pub name: String,
    pub value: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::estimate::Entity",
        from = "Column::EstimateId",
        to = "super::estimate::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Estimate,
}

impl Related<super::estimate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Estimate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
