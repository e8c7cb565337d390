//! Export and import of full backups.
//!
//! Export fetches every entity family, builds the container, pretty-prints
//! it and (optionally) encrypts the bytes before writing. Import reads the
//! file, detects encryption by attempting a plain JSON parse, then hands
//! the container to the restore orchestrator.

use chrono::{DateTime, Utc};
use sea_orm::*;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::container::{BackupContainer, BackupMetadata, SCHEMA_VERSION};
use super::crypto;
use super::error::BackupError;
use super::records::{
    CategoryRecord, ClientRecord, EstimateRecord, InvoiceRecord, ItemRecord, SupplierRecord,
};
use super::restore::{self, ConflictPolicy, RestoreReport};
use crate::models::category::Entity as Category;
use crate::models::category_custom_field::{self, Entity as CategoryCustomField};
use crate::models::client::Entity as Client;
use crate::models::estimate::Entity as Estimate;
use crate::models::estimate_custom_field::{self, Entity as EstimateCustomField};
use crate::models::estimate_line_item::{self, Entity as EstimateLineItem};
use crate::models::invoice::Entity as Invoice;
use crate::models::invoice_custom_field::{self, Entity as InvoiceCustomField};
use crate::models::invoice_line_item::{self, Entity as InvoiceLineItem};
use crate::models::item::Entity as Item;
use crate::models::supplier::Entity as Supplier;
use crate::services::SettingsStore;

pub const BACKUP_EXTENSION: &str = "stocklybackup";

#[derive(Debug, Clone, serde::Serialize)]
pub struct BackupFileInfo {
    pub file_name: String,
    pub size_bytes: u64,
    pub modified: String,
}

fn export_err(e: impl std::fmt::Display) -> BackupError {
    BackupError::ExportFailed(e.to_string())
}

fn group_by<T, F>(rows: Vec<T>, key: F) -> HashMap<String, Vec<T>>
where
    F: Fn(&T) -> Option<String>,
{
    let mut map: HashMap<String, Vec<T>> = HashMap::new();
    for row in rows {
        if let Some(k) = key(&row) {
            map.entry(k).or_default().push(row);
        }
    }
    map
}

/// Assemble the container from everything in the store.
pub async fn build_container(
    db: &DatabaseConnection,
    settings: &dyn SettingsStore,
    encrypted: bool,
) -> Result<BackupContainer, BackupError> {
    let items = Item::find().all(db).await.map_err(export_err)?;
    let item_records: Vec<serde_json::Value> = items
        .iter()
        .map(|m| serde_json::to_value(ItemRecord::from_model(m)))
        .collect::<Result<_, _>>()
        .map_err(|_| BackupError::EncodingFailed)?;

    let categories = Category::find().all(db).await.map_err(export_err)?;
    let custom_fields = CategoryCustomField::find()
        .order_by_asc(category_custom_field::Column::Name)
        .all(db)
        .await
        .map_err(export_err)?;
    let mut fields_by_category = group_by(custom_fields, |f| Some(f.category_id.clone()));
    let category_records: Vec<serde_json::Value> = categories
        .iter()
        .map(|m| {
            let fields = fields_by_category.remove(&m.id).unwrap_or_default();
            serde_json::to_value(CategoryRecord::from_models(m, &fields))
        })
        .collect::<Result<_, _>>()
        .map_err(|_| BackupError::EncodingFailed)?;

    let clients = Client::find().all(db).await.map_err(export_err)?;
    let client_records: Vec<serde_json::Value> = clients
        .iter()
        .map(|m| serde_json::to_value(ClientRecord::from_model(m)))
        .collect::<Result<_, _>>()
        .map_err(|_| BackupError::EncodingFailed)?;

    let suppliers = Supplier::find().all(db).await.map_err(export_err)?;
    let supplier_records: Vec<serde_json::Value> = suppliers
        .iter()
        .map(|m| serde_json::to_value(SupplierRecord::from_model(m)))
        .collect::<Result<_, _>>()
        .map_err(|_| BackupError::EncodingFailed)?;

    let invoices = Invoice::find().all(db).await.map_err(export_err)?;
    let invoice_lines = InvoiceLineItem::find()
        .order_by_asc(invoice_line_item::Column::Position)
        .all(db)
        .await
        .map_err(export_err)?;
    let invoice_fields = InvoiceCustomField::find().all(db).await.map_err(export_err)?;
    let mut lines_by_invoice = group_by(invoice_lines, |l| l.invoice_id.clone());
    let mut fields_by_invoice = group_by(invoice_fields, |f| f.invoice_id.clone());
    let invoice_records: Vec<serde_json::Value> = invoices
        .iter()
        .map(|m| {
            let lines = lines_by_invoice.remove(&m.id).unwrap_or_default();
            let fields = fields_by_invoice.remove(&m.id).unwrap_or_default();
            serde_json::to_value(InvoiceRecord::from_models(m, &lines, &fields))
        })
        .collect::<Result<_, _>>()
        .map_err(|_| BackupError::EncodingFailed)?;

    let estimates = Estimate::find().all(db).await.map_err(export_err)?;
    let estimate_lines = EstimateLineItem::find()
        .order_by_asc(estimate_line_item::Column::Position)
        .all(db)
        .await
        .map_err(export_err)?;
    let estimate_fields = EstimateCustomField::find().all(db).await.map_err(export_err)?;
    let mut lines_by_estimate = group_by(estimate_lines, |l| l.estimate_id.clone());
    let mut fields_by_estimate = group_by(estimate_fields, |f| f.estimate_id.clone());
    let estimate_records: Vec<serde_json::Value> = estimates
        .iter()
        .map(|m| {
            let lines = lines_by_estimate.remove(&m.id).unwrap_or_default();
            let fields = fields_by_estimate.remove(&m.id).unwrap_or_default();
            serde_json::to_value(EstimateRecord::from_models(m, &lines, &fields))
        })
        .collect::<Result<_, _>>()
        .map_err(|_| BackupError::EncodingFailed)?;

    let settings_map = settings.all().await.map_err(export_err)?;

    Ok(BackupContainer {
        version: SCHEMA_VERSION,
        metadata: Some(BackupMetadata::current(encrypted)),
        items: Some(item_records),
        categories: Some(category_records),
        clients: Some(client_records),
        suppliers: Some(supplier_records),
        invoices: Some(invoice_records),
        estimates: Some(estimate_records),
        settings: Some(settings_map),
    })
}

/// Export everything to a backup file in `dir` and return its path.
pub async fn export_all_data(
    db: &DatabaseConnection,
    settings: &dyn SettingsStore,
    dir: &Path,
    password: Option<&str>,
) -> Result<PathBuf, BackupError> {
    let container = build_container(db, settings, password.is_some()).await?;
    let mut bytes = container.to_pretty_json()?;
    if let Some(password) = password {
        bytes = crypto::encrypt(&bytes, password)?;
    }

    fs::create_dir_all(dir).map_err(|e| BackupError::FileCreationFailed(e.to_string()))?;
    let file_name = format!(
        "stockly_backup_{}.{}",
        Utc::now().format("%Y-%m-%d_%H%M%S"),
        BACKUP_EXTENSION
    );
    let path = dir.join(&file_name);
    let tmp = dir.join(format!("{}.tmp", file_name));

    // Write through a temp file; never leave it behind on failure
    if let Err(e) = fs::write(&tmp, &bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(BackupError::FileCreationFailed(e.to_string()));
    }
    if let Err(e) = fs::rename(&tmp, &path) {
        let _ = fs::remove_file(&tmp);
        return Err(BackupError::FileCreationFailed(e.to_string()));
    }

    tracing::info!(path = %path.display(), encrypted = password.is_some(), "backup written");
    Ok(path)
}

/// Parse backup bytes, decrypting first when they are not plaintext JSON.
pub fn read_container(
    bytes: &[u8],
    password: Option<&str>,
) -> Result<BackupContainer, BackupError> {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(value) => BackupContainer::from_value(value),
        Err(_) => {
            // Not valid JSON, so the payload is assumed to be encrypted
            let Some(password) = password else {
                return Err(BackupError::ImportFailed(
                    "backup is encrypted; a password is required".to_string(),
                ));
            };
            let plaintext = crypto::decrypt(bytes, password)?;
            let value = serde_json::from_slice::<serde_json::Value>(&plaintext)
                .map_err(|_| BackupError::CorruptedBackup)?;
            BackupContainer::from_value(value)
        }
    }
}

/// Import a backup file into the store.
pub async fn import_all_data(
    db: &DatabaseConnection,
    path: &Path,
    password: Option<&str>,
    policy: ConflictPolicy,
) -> Result<RestoreReport, BackupError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => BackupError::FileNotFound(path.display().to_string()),
        ErrorKind::PermissionDenied => BackupError::AccessDenied(path.display().to_string()),
        _ => BackupError::ImportFailed(e.to_string()),
    })?;

    let container = read_container(&bytes, password)?;
    let report = restore::restore(db, &container, policy).await?;
    tracing::info!(
        imported = ?report.imported,
        skipped = report.skipped.len(),
        "backup restored"
    );
    Ok(report)
}

/// Existing backup files in `dir`, newest first.
pub fn list_backups(dir: &Path) -> Result<Vec<BackupFileInfo>, BackupError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BackupError::AccessDenied(e.to_string())),
    };

    let mut backups = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(BACKUP_EXTENSION) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else { continue };
        let modified = metadata
            .modified()
            .ok()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
            .unwrap_or_default();
        backups.push(BackupFileInfo {
            file_name: entry.file_name().to_string_lossy().into_owned(),
            size_bytes: metadata.len(),
            modified,
        });
    }
    backups.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(backups)
}

/// Delete one backup file by name. Names with path separators are refused.
pub fn delete_backup(dir: &Path, file_name: &str) -> Result<(), BackupError> {
    if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
        return Err(BackupError::AccessDenied(file_name.to_string()));
    }
    let path = dir.join(file_name);
    fs::remove_file(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => BackupError::FileNotFound(file_name.to_string()),
        ErrorKind::PermissionDenied => BackupError::AccessDenied(file_name.to_string()),
        _ => BackupError::ImportFailed(e.to_string()),
    })
}
