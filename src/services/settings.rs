//! App settings as an explicit key/value store.
//!
//! The backup pipeline and the document numbering code take a
//! `SettingsStore` rather than reaching for ambient global state, so tests
//! can inject their own implementation.

use async_trait::async_trait;
use sea_orm::*;
use std::collections::BTreeMap;

use super::ServiceError;
use crate::models::app_setting::{self, Entity as AppSetting};

pub const CURRENCY: &str = "currency";
pub const BUSINESS_NAME: &str = "business.name";
pub const INVOICE_NUMBER_PREFIX: &str = "invoice.number.prefix";
pub const INVOICE_NUMBER_NEXT: &str = "invoice.number.next";
pub const ESTIMATE_NUMBER_PREFIX: &str = "estimate.number.prefix";
pub const ESTIMATE_NUMBER_NEXT: &str = "estimate.number.next";

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), ServiceError>;
    async fn all(&self) -> Result<BTreeMap<String, String>, ServiceError>;
}

/// Upsert a single settings row on any connection (plain or transactional).
pub async fn set_setting<C: ConnectionTrait>(
    conn: &C,
    key: &str,
    value: &str,
) -> Result<(), DbErr> {
    let row = app_setting::ActiveModel {
        key: Set(key.to_owned()),
        value: Set(value.to_owned()),
    };
    AppSetting::insert(row)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(app_setting::Column::Key)
                .update_column(app_setting::Column::Value)
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}

/// `SettingsStore` backed by the `app_settings` table.
#[derive(Clone)]
pub struct DbSettingsStore {
    db: DatabaseConnection,
}

impl DbSettingsStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsStore for DbSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let row = AppSetting::find_by_id(key).one(&self.db).await?;
        Ok(row.map(|r| r.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        set_setting(&self.db, key, value).await?;
        Ok(())
    }

    async fn all(&self) -> Result<BTreeMap<String, String>, ServiceError> {
        let rows = AppSetting::find().all(&self.db).await?;
        Ok(rows.into_iter().map(|r| (r.key, r.value)).collect())
    }
}
