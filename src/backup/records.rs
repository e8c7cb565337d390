//! Wire records for the backup container.
//!
//! One typed record per entity family. Keys are camelCase; optional fields
//! are omitted entirely rather than written as null, so older readers skip
//! them. Timestamps travel as Unix epoch seconds, money as doubles, ids as
//! lowercase hyphenated UUIDs and binary fields as inline base64.
//!
//! Parsing is tolerant: everything except the id and the family's defining
//! business fields is optional with a sensible default. Conversion into a
//! store model is per-row fallible and returns the skip reason as a string
//! so a malformed row never aborts the batch.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::enums::{
    CustomFieldKind, DiscountType, EstimateStatus, InvoiceStatus, MeasurementUnit,
};
use crate::models::{
    category, category_custom_field, client, estimate, estimate_custom_field, estimate_line_item,
    invoice, invoice_custom_field, invoice_line_item, item, supplier,
};
use crate::services::totals;

/// RFC-3339 store timestamp -> epoch seconds on the wire.
fn epoch_seconds(rfc3339: &str) -> Option<f64> {
    DateTime::parse_from_rfc3339(rfc3339)
        .ok()
        .map(|dt| dt.timestamp_millis() as f64 / 1000.0)
}

/// Epoch seconds on the wire -> RFC-3339 store timestamp.
fn rfc3339_from_epoch(secs: f64) -> Option<String> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis((secs * 1000.0).round() as i64)
        .map(|dt| dt.to_rfc3339())
}

fn stored_timestamp(epoch: Option<f64>, fallback: &str) -> String {
    epoch
        .and_then(rfc3339_from_epoch)
        .unwrap_or_else(|| fallback.to_owned())
}

/// Ids must be UUIDs; they are normalized to the lowercase hyphenated form.
fn normalized_id(raw: &str) -> Result<String, String> {
    Uuid::parse_str(raw.trim())
        .map(|u| u.to_string())
        .map_err(|_| format!("invalid id '{}'", raw))
}

fn require(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("missing required field: {}", field))
    } else {
        Ok(())
    }
}

// --- Items ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: String,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_added_at: Option<f64>,
}

impl ItemRecord {
    pub fn from_model(model: &item::Model) -> Self {
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            sku: model.sku.clone(),
            description: model.description.clone(),
            category: model.category.clone(),
            price: model.price,
            buy_price: model.buy_price,
            stock_quantity: model.stock_quantity,
            min_stock_level: model.min_stock_level,
            measurement_unit: model.measurement_unit,
            tax_rate: model.tax_rate,
            barcode: model.barcode.clone(),
            image_data: model.image_data.as_ref().map(|b| BASE64.encode(b)),
            created_at: epoch_seconds(&model.created_at),
            updated_at: epoch_seconds(&model.updated_at),
            inventory_added_at: epoch_seconds(&model.inventory_added_at),
        }
    }

    pub fn into_model(self, now: &str) -> Result<item::Model, String> {
        let id = normalized_id(&self.id)?;
        require(&self.name, "name")?;
        require(&self.sku, "sku")?;
        let image_data = match self.image_data {
            Some(b64) => Some(
                BASE64
                    .decode(b64.as_bytes())
                    .map_err(|_| "invalid base64 in imageData".to_string())?,
            ),
            None => None,
        };

        Ok(item::Model {
            id,
            name: self.name,
            description: self.description,
            category: self.category,
            sku: self.sku,
            price: self.price,
            buy_price: self.buy_price,
            stock_quantity: self.stock_quantity,
            min_stock_level: self.min_stock_level,
            measurement_unit: self.measurement_unit,
            tax_rate: self.tax_rate,
            barcode: self.barcode,
            image_data,
            created_at: stored_timestamp(self.created_at, now),
            updated_at: stored_timestamp(self.updated_at, now),
            inventory_added_at: stored_timestamp(self.inventory_added_at, now),
        })
    }
}

// --- Categories ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub kind: CustomFieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
}

impl CustomFieldRecord {
    pub fn from_model(model: &category_custom_field::Model) -> Self {
        let options: Option<Vec<String>> = model
            .options
            .as_ref()
            .map(|s| serde_json::from_str(s).unwrap_or_default());
        Self {
            id: Some(model.id.clone()),
            name: model.name.clone(),
            kind: model.kind,
            required: model.required,
            options,
            created_at: epoch_seconds(&model.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<f64>,
}

impl CategoryRecord {
    pub fn from_models(model: &category::Model, fields: &[category_custom_field::Model]) -> Self {
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            description: model.description.clone(),
            custom_fields: fields.iter().map(CustomFieldRecord::from_model).collect(),
            created_at: epoch_seconds(&model.created_at),
            updated_at: epoch_seconds(&model.updated_at),
        }
    }

    pub fn into_models(
        self,
        now: &str,
    ) -> Result<(category::Model, Vec<category_custom_field::Model>), String> {
        let id = normalized_id(&self.id)?;
        require(&self.name, "name")?;

        let mut fields = Vec::with_capacity(self.custom_fields.len());
        for field in self.custom_fields {
            require(&field.name, "customFields.name")?;
            let field_id = match field.id {
                Some(raw) => normalized_id(&raw)?,
                None => Uuid::new_v4().to_string(),
            };
            let options = match &field.options {
                Some(opts) => {
                    Some(serde_json::to_string(opts).map_err(|_| "invalid options".to_string())?)
                }
                None => None,
            };
            fields.push(category_custom_field::Model {
                id: field_id,
                // Back-reference to the owning category, set before persist
                category_id: id.clone(),
                name: field.name,
                kind: field.kind,
                required: field.required,
                options,
                created_at: stored_timestamp(field.created_at, now),
            });
        }

        let category = category::Model {
            id,
            name: self.name,
            description: self.description,
            created_at: stored_timestamp(self.created_at, now),
            updated_at: stored_timestamp(self.updated_at, now),
        };
        Ok((category, fields))
    }
}

// --- Clients / Suppliers ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<f64>,
}

impl ClientRecord {
    pub fn from_model(model: &client::Model) -> Self {
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
            address: model.address.clone(),
            city: model.city.clone(),
            postal_code: model.postal_code.clone(),
            country: model.country.clone(),
            notes: model.notes.clone(),
            created_at: epoch_seconds(&model.created_at),
            updated_at: epoch_seconds(&model.updated_at),
        }
    }

    pub fn into_model(self, now: &str) -> Result<client::Model, String> {
        let id = normalized_id(&self.id)?;
        require(&self.name, "name")?;
        Ok(client::Model {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            city: self.city,
            postal_code: self.postal_code,
            country: self.country,
            notes: self.notes,
            created_at: stored_timestamp(self.created_at, now),
            updated_at: stored_timestamp(self.updated_at, now),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<f64>,
}

impl SupplierRecord {
    pub fn from_model(model: &supplier::Model) -> Self {
        Self {
            id: model.id.clone(),
            name: model.name.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
            address: model.address.clone(),
            city: model.city.clone(),
            postal_code: model.postal_code.clone(),
            country: model.country.clone(),
            notes: model.notes.clone(),
            created_at: epoch_seconds(&model.created_at),
            updated_at: epoch_seconds(&model.updated_at),
        }
    }

    pub fn into_model(self, now: &str) -> Result<supplier::Model, String> {
        let id = normalized_id(&self.id)?;
        require(&self.name, "name")?;
        Ok(supplier::Model {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            city: self.city,
            postal_code: self.postal_code,
            country: self.country,
            notes: self.notes,
            created_at: stored_timestamp(self.created_at, now),
            updated_at: stored_timestamp(self.updated_at, now),
        })
    }
}

// --- Invoices / Estimates ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFieldRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: String,
    pub number: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<f64>,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_value: f64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItemRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<DocumentFieldRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<f64>,
}

impl InvoiceRecord {
    pub fn from_models(
        model: &invoice::Model,
        lines: &[invoice_line_item::Model],
        fields: &[invoice_custom_field::Model],
    ) -> Self {
        Self {
            id: model.id.clone(),
            number: model.number.clone(),
            client_name: model.client_name.clone(),
            client_address: model.client_address.clone(),
            client_email: model.client_email.clone(),
            client_phone: model.client_phone.clone(),
            status: model.status,
            issue_date: epoch_seconds(&model.issue_date),
            due_date: model.due_date.as_deref().and_then(epoch_seconds),
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            tax_rate: model.tax_rate,
            subtotal: model.subtotal,
            discount_amount: model.discount_amount,
            tax_amount: model.tax_amount,
            total: model.total,
            notes: model.notes.clone(),
            line_items: lines
                .iter()
                .map(|l| LineItemRecord {
                    id: Some(l.id.clone()),
                    name: l.name.clone(),
                    description: l.description.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    tax_rate: l.tax_rate,
                    discount: l.discount,
                    total: l.total,
                    created_at: epoch_seconds(&l.created_at),
                })
                .collect(),
            custom_fields: fields
                .iter()
                .map(|f| DocumentFieldRecord {
                    id: Some(f.id.clone()),
                    name: f.name.clone(),
                    value: f.value.clone(),
                    created_at: epoch_seconds(&f.created_at),
                })
                .collect(),
            created_at: epoch_seconds(&model.created_at),
            updated_at: epoch_seconds(&model.updated_at),
        }
    }

    /// Build the invoice and its children. Children carry the parent's id
    /// before anything is persisted, and totals are recomputed from the
    /// line items rather than trusted from the wire.
    pub fn into_models(
        self,
        now: &str,
    ) -> Result<
        (
            invoice::Model,
            Vec<invoice_line_item::Model>,
            Vec<invoice_custom_field::Model>,
        ),
        String,
    > {
        let id = normalized_id(&self.id)?;
        require(&self.number, "number")?;

        let mut lines = Vec::with_capacity(self.line_items.len());
        let mut line_totals = Vec::with_capacity(self.line_items.len());
        for (position, line) in self.line_items.into_iter().enumerate() {
            require(&line.name, "lineItems.name")?;
            let line_id = match line.id {
                Some(raw) => normalized_id(&raw)?,
                None => Uuid::new_v4().to_string(),
            };
            let total = totals::line_total(line.quantity, line.unit_price, line.discount, line.tax_rate);
            line_totals.push(total);
            lines.push(invoice_line_item::Model {
                id: line_id,
                invoice_id: Some(id.clone()),
                position: position as i32,
                name: line.name,
                description: line.description,
                quantity: line.quantity,
                unit_price: line.unit_price,
                tax_rate: line.tax_rate,
                discount: line.discount,
                total,
                created_at: stored_timestamp(line.created_at, now),
            });
        }

        let mut fields = Vec::with_capacity(self.custom_fields.len());
        for field in self.custom_fields {
            require(&field.name, "customFields.name")?;
            let field_id = match field.id {
                Some(raw) => normalized_id(&raw)?,
                None => Uuid::new_v4().to_string(),
            };
            fields.push(invoice_custom_field::Model {
                id: field_id,
                invoice_id: Some(id.clone()),
                name: field.name,
                value: field.value,
                created_at: stored_timestamp(field.created_at, now),
            });
        }

        let doc = totals::document_totals(
            &line_totals,
            self.discount_type,
            self.discount_value,
            self.tax_rate,
        );
        let invoice = invoice::Model {
            id,
            number: self.number,
            client_name: self.client_name,
            client_address: self.client_address,
            client_email: self.client_email,
            client_phone: self.client_phone,
            status: self.status,
            issue_date: stored_timestamp(self.issue_date, now),
            due_date: self.due_date.and_then(rfc3339_from_epoch),
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            tax_rate: self.tax_rate,
            subtotal: doc.subtotal,
            discount_amount: doc.discount_amount,
            tax_amount: doc.tax_amount,
            total: doc.total,
            notes: self.notes,
            created_at: stored_timestamp(self.created_at, now),
            updated_at: stored_timestamp(self.updated_at, now),
        };
        Ok((invoice, lines, fields))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRecord {
    pub id: String,
    pub number: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub status: EstimateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<f64>,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_value: f64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItemRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<DocumentFieldRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<f64>,
}

impl EstimateRecord {
    pub fn from_models(
        model: &estimate::Model,
        lines: &[estimate_line_item::Model],
        fields: &[estimate_custom_field::Model],
    ) -> Self {
        Self {
            id: model.id.clone(),
            number: model.number.clone(),
            client_name: model.client_name.clone(),
            client_address: model.client_address.clone(),
            client_email: model.client_email.clone(),
            client_phone: model.client_phone.clone(),
            status: model.status,
            issue_date: epoch_seconds(&model.issue_date),
            expiry_date: model.expiry_date.as_deref().and_then(epoch_seconds),
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            tax_rate: model.tax_rate,
            subtotal: model.subtotal,
            discount_amount: model.discount_amount,
            tax_amount: model.tax_amount,
            total: model.total,
            notes: model.notes.clone(),
            line_items: lines
                .iter()
                .map(|l| LineItemRecord {
                    id: Some(l.id.clone()),
                    name: l.name.clone(),
                    description: l.description.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                    tax_rate: l.tax_rate,
                    discount: l.discount,
                    total: l.total,
                    created_at: epoch_seconds(&l.created_at),
                })
                .collect(),
            custom_fields: fields
                .iter()
                .map(|f| DocumentFieldRecord {
                    id: Some(f.id.clone()),
                    name: f.name.clone(),
                    value: f.value.clone(),
                    created_at: epoch_seconds(&f.created_at),
                })
                .collect(),
            created_at: epoch_seconds(&model.created_at),
            updated_at: epoch_seconds(&model.updated_at),
        }
    }

    pub fn into_models(
        self,
        now: &str,
    ) -> Result<
        (
            estimate::Model,
            Vec<estimate_line_item::Model>,
            Vec<estimate_custom_field::Model>,
        ),
        String,
    > {
        let id = normalized_id(&self.id)?;
        require(&self.number, "number")?;

        let mut lines = Vec::with_capacity(self.line_items.len());
        let mut line_totals = Vec::with_capacity(self.line_items.len());
        for (position, line) in self.line_items.into_iter().enumerate() {
            require(&line.name, "lineItems.name")?;
            let line_id = match line.id {
                Some(raw) => normalized_id(&raw)?,
                None => Uuid::new_v4().to_string(),
            };
            let total = totals::line_total(line.quantity, line.unit_price, line.discount, line.tax_rate);
            line_totals.push(total);
            lines.push(estimate_line_item::Model {
                id: line_id,
                estimate_id: Some(id.clone()),
                position: position as i32,
                name: line.name,
                description: line.description,
                quantity: line.quantity,
                unit_price: line.unit_price,
                tax_rate: line.tax_rate,
                discount: line.discount,
                total,
                created_at: stored_timestamp(line.created_at, now),
            });
        }

        let mut fields = Vec::with_capacity(self.custom_fields.len());
        for field in self.custom_fields {
            require(&field.name, "customFields.name")?;
            let field_id = match field.id {
                Some(raw) => normalized_id(&raw)?,
                None => Uuid::new_v4().to_string(),
            };
            fields.push(estimate_custom_field::Model {
                id: field_id,
                estimate_id: Some(id.clone()),
                name: field.name,
                value: field.value,
                created_at: stored_timestamp(field.created_at, now),
            });
        }

        let doc = totals::document_totals(
            &line_totals,
            self.discount_type,
            self.discount_value,
            self.tax_rate,
        );
        let estimate = estimate::Model {
            id,
            number: self.number,
            client_name: self.client_name,
            client_address: self.client_address,
            client_email: self.client_email,
            client_phone: self.client_phone,
            status: self.status,
            issue_date: stored_timestamp(self.issue_date, now),
            expiry_date: self.expiry_date.and_then(rfc3339_from_epoch),
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            tax_rate: self.tax_rate,
            subtotal: doc.subtotal,
            discount_amount: doc.discount_amount,
            tax_amount: doc.tax_amount,
            total: doc.total,
            notes: self.notes,
            created_at: stored_timestamp(self.created_at, now),
            updated_at: stored_timestamp(self.updated_at, now),
        };
        Ok((estimate, lines, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_optionals_are_omitted_from_json() {
        let record = ItemRecord {
            id: "5f64a2c8-6bfa-4b1e-9d10-1f2a3b4c5d6e".to_string(),
            name: "Gold Ring".to_string(),
            sku: "RING-001".to_string(),
            description: String::new(),
            category: "Rings".to_string(),
            price: 249.99,
            buy_price: 120.0,
            stock_quantity: 3,
            min_stock_level: 1,
            measurement_unit: MeasurementUnit::Piece,
            tax_rate: 20.0,
            barcode: None,
            image_data: None,
            created_at: Some(1700000000.0),
            updated_at: Some(1700000000.0),
            inventory_added_at: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("barcode"));
        assert!(!obj.contains_key("imageData"));
        assert!(!obj.contains_key("inventoryAddedAt"));
        assert_eq!(obj["measurementUnit"], "piece");
    }

    #[test]
    fn missing_required_field_is_a_row_error() {
        let value = serde_json::json!({
            "id": "5f64a2c8-6bfa-4b1e-9d10-1f2a3b4c5d6e",
            "name": "No SKU here"
        });
        let parsed: Result<ItemRecord, _> = serde_json::from_value(value);
        assert!(parsed.is_err());
    }

    #[test]
    fn invalid_id_is_rejected() {
        let record = ClientRecord {
            id: "not-a-uuid".to_string(),
            name: "Alice".to_string(),
            email: None,
            phone: None,
            address: None,
            city: None,
            postal_code: None,
            country: None,
            notes: None,
            created_at: None,
            updated_at: None,
        };
        let err = record.into_model("2024-01-01T00:00:00+00:00").unwrap_err();
        assert!(err.contains("invalid id"));
    }

    #[test]
    fn timestamps_round_trip_through_epoch_seconds() {
        let rfc = "2024-05-01T12:30:45+00:00";
        let secs = epoch_seconds(rfc).unwrap();
        let back = rfc3339_from_epoch(secs).unwrap();
        assert_eq!(epoch_seconds(&back).unwrap(), secs);
    }

    #[test]
    fn invoice_totals_are_recomputed_on_import() {
        let record = InvoiceRecord {
            id: "0a8e6f9e-40db-49b5-8f9b-52b1a7e2a9d1".to_string(),
            number: "INV-0001".to_string(),
            client_name: "Alice".to_string(),
            client_address: None,
            client_email: None,
            client_phone: None,
            status: InvoiceStatus::Sent,
            issue_date: Some(1700000000.0),
            due_date: None,
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            tax_rate: 8.0,
            // Deliberately wrong stored totals
            subtotal: 1.0,
            discount_amount: 2.0,
            tax_amount: 3.0,
            total: 4.0,
            notes: None,
            line_items: vec![LineItemRecord {
                id: None,
                name: "Widget".to_string(),
                description: None,
                quantity: 2.0,
                unit_price: 50.0,
                tax_rate: 0.0,
                discount: 0.0,
                total: 0.0,
                created_at: None,
            }],
            custom_fields: vec![],
            created_at: None,
            updated_at: None,
        };
        let (invoice, lines, _) = record.into_models("2024-01-01T00:00:00+00:00").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].invoice_id.as_deref(), Some(invoice.id.as_str()));
        assert_eq!(invoice.subtotal, 100.0);
        assert_eq!(invoice.discount_amount, 10.0);
        assert_eq!(invoice.tax_amount, 7.2);
        assert_eq!(invoice.total, 97.2);
    }
}
