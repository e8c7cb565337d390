//! Restore orchestrator.
//!
//! Phases run in a fixed dependency order (categories before items so
//! category names exist when items land), each skippable when its section
//! is absent. The whole restore runs inside one transaction: structural
//! failures roll back every phase, while malformed rows are skipped and
//! reported.

use sea_orm::*;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use super::container::BackupContainer;
use super::error::BackupError;
use super::records::{
    CategoryRecord, ClientRecord, EstimateRecord, InvoiceRecord, ItemRecord, SupplierRecord,
};
use crate::models::app_setting::{self, Entity as AppSetting};
use crate::models::category::Entity as Category;
use crate::models::category_custom_field::{self, Entity as CategoryCustomField};
use crate::models::client::Entity as Client;
use crate::models::estimate::Entity as Estimate;
use crate::models::estimate_custom_field::{self, Entity as EstimateCustomField};
use crate::models::estimate_line_item::{self, Entity as EstimateLineItem};
use crate::models::invoice::Entity as Invoice;
use crate::models::invoice_custom_field::{self, Entity as InvoiceCustomField};
use crate::models::invoice_line_item::{self, Entity as InvoiceLineItem};
use crate::models::item::{self, Entity as Item};
use crate::models::supplier::Entity as Supplier;
use crate::services::settings::set_setting;

/// What to do with rows already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Clear each restored family before inserting (destructive restore)
    Replace,
    /// Upsert by id, leaving unrelated rows in place
    Merge,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::Replace
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SkippedRow {
    pub section: String,
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Default, serde::Serialize)]
pub struct RestoreReport {
    pub imported: BTreeMap<String, usize>,
    pub skipped: Vec<SkippedRow>,
}

impl RestoreReport {
    fn set_imported(&mut self, section: &str, count: usize) {
        self.imported.insert(section.to_string(), count);
    }

    fn skip(&mut self, section: &str, index: usize, reason: String) {
        tracing::warn!(section, index, %reason, "skipping backup row");
        self.skipped.push(SkippedRow {
            section: section.to_string(),
            index,
            reason,
        });
    }
}

pub async fn restore(
    db: &DatabaseConnection,
    container: &BackupContainer,
    policy: ConflictPolicy,
) -> Result<RestoreReport, BackupError> {
    let txn = db.begin().await?;
    let mut report = RestoreReport::default();
    let now = chrono::Utc::now().to_rfc3339();

    restore_categories(&txn, container.categories.as_deref(), policy, &mut report, &now).await?;
    restore_items(&txn, container.items.as_deref(), policy, &mut report, &now).await?;
    restore_clients(&txn, container.clients.as_deref(), policy, &mut report, &now).await?;
    restore_suppliers(&txn, container.suppliers.as_deref(), policy, &mut report, &now).await?;
    restore_invoices(&txn, container.invoices.as_deref(), policy, &mut report, &now).await?;
    restore_estimates(&txn, container.estimates.as_deref(), policy, &mut report, &now).await?;
    restore_settings(&txn, container.settings.as_ref(), policy, &mut report).await?;

    txn.commit().await?;
    Ok(report)
}

fn decode_row<T: serde::de::DeserializeOwned>(
    value: &Value,
    section: &str,
    index: usize,
    report: &mut RestoreReport,
) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(record) => Some(record),
        Err(e) => {
            report.skip(section, index, e.to_string());
            None
        }
    }
}

async fn restore_categories<C: ConnectionTrait>(
    conn: &C,
    rows: Option<&[Value]>,
    policy: ConflictPolicy,
    report: &mut RestoreReport,
    now: &str,
) -> Result<(), BackupError> {
    let Some(rows) = rows else { return Ok(()) };

    if policy == ConflictPolicy::Replace {
        CategoryCustomField::delete_many().exec(conn).await?;
        Category::delete_many().exec(conn).await?;
    }

    let mut count = 0;
    for (index, value) in rows.iter().enumerate() {
        let Some(record) = decode_row::<CategoryRecord>(value, "categories", index, report) else {
            continue;
        };
        let (category, fields) = match record.into_models(now) {
            Ok(models) => models,
            Err(reason) => {
                report.skip("categories", index, reason);
                continue;
            }
        };

        if policy == ConflictPolicy::Merge {
            CategoryCustomField::delete_many()
                .filter(category_custom_field::Column::CategoryId.eq(&category.id))
                .exec(conn)
                .await?;
            Category::delete_by_id(category.id.as_str()).exec(conn).await?;
        }

        if let Err(e) = category.into_active_model().insert(conn).await {
            report.skip("categories", index, e.to_string());
            continue;
        }
        for field in fields {
            field.into_active_model().insert(conn).await?;
        }
        count += 1;
    }
    report.set_imported("categories", count);
    Ok(())
}

async fn restore_items<C: ConnectionTrait>(
    conn: &C,
    rows: Option<&[Value]>,
    policy: ConflictPolicy,
    report: &mut RestoreReport,
    now: &str,
) -> Result<(), BackupError> {
    let Some(rows) = rows else { return Ok(()) };

    if policy == ConflictPolicy::Replace {
        Item::delete_many().exec(conn).await?;
    }

    // SKU uniqueness holds inside the imported batch and against kept rows
    let mut seen_skus: HashSet<String> = HashSet::new();
    let mut count = 0;
    for (index, value) in rows.iter().enumerate() {
        let Some(record) = decode_row::<ItemRecord>(value, "items", index, report) else {
            continue;
        };
        let model = match record.into_model(now) {
            Ok(model) => model,
            Err(reason) => {
                report.skip("items", index, reason);
                continue;
            }
        };

        if !seen_skus.insert(model.sku.clone()) {
            report.skip("items", index, format!("duplicate sku '{}'", model.sku));
            continue;
        }

        if policy == ConflictPolicy::Merge {
            Item::delete_by_id(model.id.as_str()).exec(conn).await?;
            let conflicting = Item::find()
                .filter(item::Column::Sku.eq(&model.sku))
                .count(conn)
                .await?;
            if conflicting > 0 {
                report.skip(
                    "items",
                    index,
                    format!("sku '{}' already exists in the store", model.sku),
                );
                continue;
            }
        }

        if let Err(e) = model.into_active_model().insert(conn).await {
            report.skip("items", index, e.to_string());
            continue;
        }
        count += 1;
    }
    report.set_imported("items", count);
    Ok(())
}

async fn restore_clients<C: ConnectionTrait>(
    conn: &C,
    rows: Option<&[Value]>,
    policy: ConflictPolicy,
    report: &mut RestoreReport,
    now: &str,
) -> Result<(), BackupError> {
    let Some(rows) = rows else { return Ok(()) };

    if policy == ConflictPolicy::Replace {
        Client::delete_many().exec(conn).await?;
    }

    let mut count = 0;
    for (index, value) in rows.iter().enumerate() {
        let Some(record) = decode_row::<ClientRecord>(value, "clients", index, report) else {
            continue;
        };
        let model = match record.into_model(now) {
            Ok(model) => model,
            Err(reason) => {
                report.skip("clients", index, reason);
                continue;
            }
        };
        if policy == ConflictPolicy::Merge {
            Client::delete_by_id(model.id.as_str()).exec(conn).await?;
        }
        if let Err(e) = model.into_active_model().insert(conn).await {
            report.skip("clients", index, e.to_string());
            continue;
        }
        count += 1;
    }
    report.set_imported("clients", count);
    Ok(())
}

async fn restore_suppliers<C: ConnectionTrait>(
    conn: &C,
    rows: Option<&[Value]>,
    policy: ConflictPolicy,
    report: &mut RestoreReport,
    now: &str,
) -> Result<(), BackupError> {
    let Some(rows) = rows else { return Ok(()) };

    if policy == ConflictPolicy::Replace {
        Supplier::delete_many().exec(conn).await?;
    }

    let mut count = 0;
    for (index, value) in rows.iter().enumerate() {
        let Some(record) = decode_row::<SupplierRecord>(value, "suppliers", index, report) else {
            continue;
        };
        let model = match record.into_model(now) {
            Ok(model) => model,
            Err(reason) => {
                report.skip("suppliers", index, reason);
                continue;
            }
        };
        if policy == ConflictPolicy::Merge {
            Supplier::delete_by_id(model.id.as_str()).exec(conn).await?;
        }
        if let Err(e) = model.into_active_model().insert(conn).await {
            report.skip("suppliers", index, e.to_string());
            continue;
        }
        count += 1;
    }
    report.set_imported("suppliers", count);
    Ok(())
}

async fn restore_invoices<C: ConnectionTrait>(
    conn: &C,
    rows: Option<&[Value]>,
    policy: ConflictPolicy,
    report: &mut RestoreReport,
    now: &str,
) -> Result<(), BackupError> {
    let Some(rows) = rows else { return Ok(()) };

    if policy == ConflictPolicy::Replace {
        InvoiceLineItem::delete_many().exec(conn).await?;
        InvoiceCustomField::delete_many().exec(conn).await?;
        Invoice::delete_many().exec(conn).await?;
    }

    let mut count = 0;
    for (index, value) in rows.iter().enumerate() {
        let Some(record) = decode_row::<InvoiceRecord>(value, "invoices", index, report) else {
            continue;
        };
        let (invoice, lines, fields) = match record.into_models(now) {
            Ok(models) => models,
            Err(reason) => {
                report.skip("invoices", index, reason);
                continue;
            }
        };

        if policy == ConflictPolicy::Merge {
            InvoiceLineItem::delete_many()
                .filter(invoice_line_item::Column::InvoiceId.eq(&invoice.id))
                .exec(conn)
                .await?;
            InvoiceCustomField::delete_many()
                .filter(invoice_custom_field::Column::InvoiceId.eq(&invoice.id))
                .exec(conn)
                .await?;
            Invoice::delete_by_id(invoice.id.as_str()).exec(conn).await?;
        }

        if let Err(e) = invoice.into_active_model().insert(conn).await {
            report.skip("invoices", index, e.to_string());
            continue;
        }
        for line in lines {
            line.into_active_model().insert(conn).await?;
        }
        for field in fields {
            field.into_active_model().insert(conn).await?;
        }
        count += 1;
    }
    report.set_imported("invoices", count);
    Ok(())
}

async fn restore_estimates<C: ConnectionTrait>(
    conn: &C,
    rows: Option<&[Value]>,
    policy: ConflictPolicy,
    report: &mut RestoreReport,
    now: &str,
) -> Result<(), BackupError> {
    let Some(rows) = rows else { return Ok(()) };

    if policy == ConflictPolicy::Replace {
        EstimateLineItem::delete_many().exec(conn).await?;
        EstimateCustomField::delete_many().exec(conn).await?;
        Estimate::delete_many().exec(conn).await?;
    }

    let mut count = 0;
    for (index, value) in rows.iter().enumerate() {
        let Some(record) = decode_row::<EstimateRecord>(value, "estimates", index, report) else {
            continue;
        };
        let (estimate, lines, fields) = match record.into_models(now) {
            Ok(models) => models,
            Err(reason) => {
                report.skip("estimates", index, reason);
                continue;
            }
        };

        if policy == ConflictPolicy::Merge {
            EstimateLineItem::delete_many()
                .filter(estimate_line_item::Column::EstimateId.eq(&estimate.id))
                .exec(conn)
                .await?;
            EstimateCustomField::delete_many()
                .filter(estimate_custom_field::Column::EstimateId.eq(&estimate.id))
                .exec(conn)
                .await?;
            Estimate::delete_by_id(estimate.id.as_str()).exec(conn).await?;
        }

        if let Err(e) = estimate.into_active_model().insert(conn).await {
            report.skip("estimates", index, e.to_string());
            continue;
        }
        for line in lines {
            line.into_active_model().insert(conn).await?;
        }
        for field in fields {
            field.into_active_model().insert(conn).await?;
        }
        count += 1;
    }
    report.set_imported("estimates", count);
    Ok(())
}

async fn restore_settings<C: ConnectionTrait>(
    conn: &C,
    entries: Option<&BTreeMap<String, String>>,
    policy: ConflictPolicy,
    report: &mut RestoreReport,
) -> Result<(), BackupError> {
    let Some(entries) = entries else { return Ok(()) };

    if policy == ConflictPolicy::Replace {
        AppSetting::delete_many().exec(conn).await?;
        for (key, value) in entries {
            let row = app_setting::ActiveModel {
                key: Set(key.clone()),
                value: Set(value.clone()),
            };
            row.insert(conn).await?;
        }
    } else {
        for (key, value) in entries {
            set_setting(conn, key, value).await?;
        }
    }
    report.set_imported("settings", entries.len());
    Ok(())
}
