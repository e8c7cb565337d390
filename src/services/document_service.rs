//! Invoice/Estimate service - documents with nested line items and custom
//! fields. Mirrored pairs of functions; the two families share drafts and
//! totals math but live in separate tables.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use super::settings::{
    SettingsStore, ESTIMATE_NUMBER_NEXT, ESTIMATE_NUMBER_PREFIX, INVOICE_NUMBER_NEXT,
    INVOICE_NUMBER_PREFIX,
};
use super::totals;
use super::ServiceError;
use crate::models::enums::{DiscountType, EstimateStatus, InvoiceStatus};
use crate::models::estimate::{self, Entity as Estimate};
use crate::models::estimate_custom_field::{self, Entity as EstimateCustomField};
use crate::models::estimate_line_item::{self, Entity as EstimateLineItem};
use crate::models::invoice::{self, Entity as Invoice};
use crate::models::invoice_custom_field::{self, Entity as InvoiceCustomField};
use crate::models::invoice_line_item::{self, Entity as InvoiceLineItem};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LineItemDraft {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub discount: f64,
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CustomFieldDraft {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct InvoiceDraft {
    pub number: Option<String>,
    pub client_name: String,
    pub client_address: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    #[serde(default)]
    pub status: InvoiceStatus,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_value: f64,
    #[serde(default)]
    pub tax_rate: f64,
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItemDraft>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDraft>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EstimateDraft {
    pub number: Option<String>,
    pub client_name: String,
    pub client_address: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    #[serde(default)]
    pub status: EstimateStatus,
    pub issue_date: Option<String>,
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_value: f64,
    #[serde(default)]
    pub tax_rate: f64,
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItemDraft>,
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldDraft>,
}

/// Enriched invoice with its children, ordered by position
#[derive(Debug, serde::Serialize)]
pub struct InvoiceWithChildren {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub line_items: Vec<invoice_line_item::Model>,
    pub custom_fields: Vec<invoice_custom_field::Model>,
}

#[derive(Debug, serde::Serialize)]
pub struct EstimateWithChildren {
    #[serde(flatten)]
    pub estimate: estimate::Model,
    pub line_items: Vec<estimate_line_item::Model>,
    pub custom_fields: Vec<estimate_custom_field::Model>,
}

/// Next document number from the settings counters, e.g. INV-0007.
async fn next_number(
    store: &dyn SettingsStore,
    prefix_key: &str,
    next_key: &str,
    default_prefix: &str,
) -> Result<String, ServiceError> {
    let prefix = store
        .get(prefix_key)
        .await?
        .unwrap_or_else(|| default_prefix.to_string());
    let next: u64 = store
        .get(next_key)
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    store.set(next_key, &(next + 1).to_string()).await?;
    Ok(format!("{}{:04}", prefix, next))
}

pub async fn next_invoice_number(store: &dyn SettingsStore) -> Result<String, ServiceError> {
    next_number(store, INVOICE_NUMBER_PREFIX, INVOICE_NUMBER_NEXT, "INV-").await
}

pub async fn next_estimate_number(store: &dyn SettingsStore) -> Result<String, ServiceError> {
    next_number(store, ESTIMATE_NUMBER_PREFIX, ESTIMATE_NUMBER_NEXT, "EST-").await
}

fn computed_totals(draft_lines: &[LineItemDraft], discount_type: DiscountType, discount_value: f64, tax_rate: f64) -> (Vec<f64>, totals::DocumentTotals) {
    let line_totals: Vec<f64> = draft_lines
        .iter()
        .map(|l| totals::line_total(l.quantity, l.unit_price, l.discount, l.tax_rate))
        .collect();
    let doc = totals::document_totals(&line_totals, discount_type, discount_value, tax_rate);
    (line_totals, doc)
}

pub async fn create_invoice(
    db: &DatabaseConnection,
    store: &dyn SettingsStore,
    draft: InvoiceDraft,
) -> Result<InvoiceWithChildren, ServiceError> {
    if draft.client_name.trim().is_empty() {
        return Err(ServiceError::InvalidState(
            "invoice needs a client name".to_string(),
        ));
    }

    let number = match draft.number {
        Some(n) if !n.trim().is_empty() => n,
        _ => next_invoice_number(store).await?,
    };

    let now = Utc::now().to_rfc3339();
    let invoice_id = Uuid::new_v4().to_string();
    let (line_totals, doc) = computed_totals(
        &draft.line_items,
        draft.discount_type,
        draft.discount_value,
        draft.tax_rate,
    );

    let new_invoice = invoice::ActiveModel {
        id: Set(invoice_id.clone()),
        number: Set(number),
        client_name: Set(draft.client_name),
        client_address: Set(draft.client_address),
        client_email: Set(draft.client_email),
        client_phone: Set(draft.client_phone),
        status: Set(draft.status),
        issue_date: Set(draft.issue_date.unwrap_or_else(|| now.clone())),
        due_date: Set(draft.due_date),
        discount_type: Set(draft.discount_type),
        discount_value: Set(draft.discount_value),
        tax_rate: Set(draft.tax_rate),
        subtotal: Set(doc.subtotal),
        discount_amount: Set(doc.discount_amount),
        tax_amount: Set(doc.tax_amount),
        total: Set(doc.total),
        notes: Set(draft.notes),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
    };
    let saved = new_invoice.insert(db).await?;

    let mut line_items = Vec::with_capacity(draft.line_items.len());
    for (position, (line, total)) in draft.line_items.into_iter().zip(line_totals).enumerate() {
        let row = invoice_line_item::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            // Children point back at the parent before anything is read back
            invoice_id: Set(Some(invoice_id.clone())),
            position: Set(position as i32),
            name: Set(line.name),
            description: Set(line.description),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            tax_rate: Set(line.tax_rate),
            discount: Set(line.discount),
            total: Set(total),
            created_at: Set(now.clone()),
        };
        line_items.push(row.insert(db).await?);
    }

    let mut custom_fields = Vec::with_capacity(draft.custom_fields.len());
    for field in draft.custom_fields {
        let row = invoice_custom_field::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            invoice_id: Set(Some(invoice_id.clone())),
            name: Set(field.name),
            value: Set(field.value),
            created_at: Set(now.clone()),
        };
        custom_fields.push(row.insert(db).await?);
    }

    Ok(InvoiceWithChildren {
        invoice: saved,
        line_items,
        custom_fields,
    })
}

pub async fn update_invoice(
    db: &DatabaseConnection,
    id: &str,
    draft: InvoiceDraft,
) -> Result<InvoiceWithChildren, ServiceError> {
    let existing = Invoice::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let now = Utc::now().to_rfc3339();
    let (line_totals, doc) = computed_totals(
        &draft.line_items,
        draft.discount_type,
        draft.discount_value,
        draft.tax_rate,
    );

    let mut active: invoice::ActiveModel = existing.into();
    if let Some(number) = draft.number {
        active.number = Set(number);
    }
    active.client_name = Set(draft.client_name);
    active.client_address = Set(draft.client_address);
    active.client_email = Set(draft.client_email);
    active.client_phone = Set(draft.client_phone);
    active.status = Set(draft.status);
    if let Some(issue_date) = draft.issue_date {
        active.issue_date = Set(issue_date);
    }
    active.due_date = Set(draft.due_date);
    active.discount_type = Set(draft.discount_type);
    active.discount_value = Set(draft.discount_value);
    active.tax_rate = Set(draft.tax_rate);
    active.subtotal = Set(doc.subtotal);
    active.discount_amount = Set(doc.discount_amount);
    active.tax_amount = Set(doc.tax_amount);
    active.total = Set(doc.total);
    active.notes = Set(draft.notes);
    active.updated_at = Set(now.clone());
    let saved = active.update(db).await?;

    // Children are replaced wholesale on update
    InvoiceLineItem::delete_many()
        .filter(invoice_line_item::Column::InvoiceId.eq(id))
        .exec(db)
        .await?;
    InvoiceCustomField::delete_many()
        .filter(invoice_custom_field::Column::InvoiceId.eq(id))
        .exec(db)
        .await?;

    let mut line_items = Vec::with_capacity(draft.line_items.len());
    for (position, (line, total)) in draft.line_items.into_iter().zip(line_totals).enumerate() {
        let row = invoice_line_item::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            invoice_id: Set(Some(id.to_owned())),
            position: Set(position as i32),
            name: Set(line.name),
            description: Set(line.description),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            tax_rate: Set(line.tax_rate),
            discount: Set(line.discount),
            total: Set(total),
            created_at: Set(now.clone()),
        };
        line_items.push(row.insert(db).await?);
    }

    let mut custom_fields = Vec::with_capacity(draft.custom_fields.len());
    for field in draft.custom_fields {
        let row = invoice_custom_field::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            invoice_id: Set(Some(id.to_owned())),
            name: Set(field.name),
            value: Set(field.value),
            created_at: Set(now.clone()),
        };
        custom_fields.push(row.insert(db).await?);
    }

    Ok(InvoiceWithChildren {
        invoice: saved,
        line_items,
        custom_fields,
    })
}

/// Deleting a document detaches its children first: back-references are
/// nullified, never cascaded.
pub async fn delete_invoice(db: &DatabaseConnection, id: &str) -> Result<(), ServiceError> {
    let existing = Invoice::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    InvoiceLineItem::update_many()
        .col_expr(invoice_line_item::Column::InvoiceId, Expr::value(Value::String(None)))
        .filter(invoice_line_item::Column::InvoiceId.eq(id))
        .exec(db)
        .await?;
    InvoiceCustomField::update_many()
        .col_expr(invoice_custom_field::Column::InvoiceId, Expr::value(Value::String(None)))
        .filter(invoice_custom_field::Column::InvoiceId.eq(id))
        .exec(db)
        .await?;

    existing.delete(db).await?;
    Ok(())
}

pub async fn get_invoice(
    db: &DatabaseConnection,
    id: &str,
) -> Result<InvoiceWithChildren, ServiceError> {
    let invoice = Invoice::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;
    let line_items = InvoiceLineItem::find()
        .filter(invoice_line_item::Column::InvoiceId.eq(id))
        .order_by_asc(invoice_line_item::Column::Position)
        .all(db)
        .await?;
    let custom_fields = InvoiceCustomField::find()
        .filter(invoice_custom_field::Column::InvoiceId.eq(id))
        .all(db)
        .await?;
    Ok(InvoiceWithChildren {
        invoice,
        line_items,
        custom_fields,
    })
}

pub async fn create_estimate(
    db: &DatabaseConnection,
    store: &dyn SettingsStore,
    draft: EstimateDraft,
) -> Result<EstimateWithChildren, ServiceError> {
    if draft.client_name.trim().is_empty() {
        return Err(ServiceError::InvalidState(
            "estimate needs a client name".to_string(),
        ));
    }

    let number = match draft.number {
        Some(n) if !n.trim().is_empty() => n,
        _ => next_estimate_number(store).await?,
    };

    let now = Utc::now().to_rfc3339();
    let estimate_id = Uuid::new_v4().to_string();
    let (line_totals, doc) = computed_totals(
        &draft.line_items,
        draft.discount_type,
        draft.discount_value,
        draft.tax_rate,
    );

    let new_estimate = estimate::ActiveModel {
        id: Set(estimate_id.clone()),
        number: Set(number),
        client_name: Set(draft.client_name),
        client_address: Set(draft.client_address),
        client_email: Set(draft.client_email),
        client_phone: Set(draft.client_phone),
        status: Set(draft.status),
        issue_date: Set(draft.issue_date.unwrap_or_else(|| now.clone())),
        expiry_date: Set(draft.expiry_date),
        discount_type: Set(draft.discount_type),
        discount_value: Set(draft.discount_value),
        tax_rate: Set(draft.tax_rate),
        subtotal: Set(doc.subtotal),
        discount_amount: Set(doc.discount_amount),
        tax_amount: Set(doc.tax_amount),
        total: Set(doc.total),
        notes: Set(draft.notes),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
    };
    let saved = new_estimate.insert(db).await?;

    let mut line_items = Vec::with_capacity(draft.line_items.len());
    for (position, (line, total)) in draft.line_items.into_iter().zip(line_totals).enumerate() {
        let row = estimate_line_item::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            estimate_id: Set(Some(estimate_id.clone())),
            position: Set(position as i32),
            name: Set(line.name),
            description: Set(line.description),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            tax_rate: Set(line.tax_rate),
            discount: Set(line.discount),
            total: Set(total),
            created_at: Set(now.clone()),
        };
        line_items.push(row.insert(db).await?);
    }

    let mut custom_fields = Vec::with_capacity(draft.custom_fields.len());
    for field in draft.custom_fields {
        let row = estimate_custom_field::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            estimate_id: Set(Some(estimate_id.clone())),
            name: Set(field.name),
            value: Set(field.value),
            created_at: Set(now.clone()),
        };
        custom_fields.push(row.insert(db).await?);
    }

    Ok(EstimateWithChildren {
        estimate: saved,
        line_items,
        custom_fields,
    })
}

pub async fn update_estimate(
    db: &DatabaseConnection,
    id: &str,
    draft: EstimateDraft,
) -> Result<EstimateWithChildren, ServiceError> {
    let existing = Estimate::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    let now = Utc::now().to_rfc3339();
    let (line_totals, doc) = computed_totals(
        &draft.line_items,
        draft.discount_type,
        draft.discount_value,
        draft.tax_rate,
    );

    let mut active: estimate::ActiveModel = existing.into();
    if let Some(number) = draft.number {
        active.number = Set(number);
    }
    active.client_name = Set(draft.client_name);
    active.client_address = Set(draft.client_address);
    active.client_email = Set(draft.client_email);
    active.client_phone = Set(draft.client_phone);
    active.status = Set(draft.status);
    if let Some(issue_date) = draft.issue_date {
        active.issue_date = Set(issue_date);
    }
    active.expiry_date = Set(draft.expiry_date);
    active.discount_type = Set(draft.discount_type);
    active.discount_value = Set(draft.discount_value);
    active.tax_rate = Set(draft.tax_rate);
    active.subtotal = Set(doc.subtotal);
    active.discount_amount = Set(doc.discount_amount);
    active.tax_amount = Set(doc.tax_amount);
    active.total = Set(doc.total);
    active.notes = Set(draft.notes);
    active.updated_at = Set(now.clone());
    let saved = active.update(db).await?;

    EstimateLineItem::delete_many()
        .filter(estimate_line_item::Column::EstimateId.eq(id))
        .exec(db)
        .await?;
    EstimateCustomField::delete_many()
        .filter(estimate_custom_field::Column::EstimateId.eq(id))
        .exec(db)
        .await?;

    let mut line_items = Vec::with_capacity(draft.line_items.len());
    for (position, (line, total)) in draft.line_items.into_iter().zip(line_totals).enumerate() {
        let row = estimate_line_item::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            estimate_id: Set(Some(id.to_owned())),
            position: Set(position as i32),
            name: Set(line.name),
            description: Set(line.description),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            tax_rate: Set(line.tax_rate),
            discount: Set(line.discount),
            total: Set(total),
            created_at: Set(now.clone()),
        };
        line_items.push(row.insert(db).await?);
    }

    let mut custom_fields = Vec::with_capacity(draft.custom_fields.len());
    for field in draft.custom_fields {
        let row = estimate_custom_field::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            estimate_id: Set(Some(id.to_owned())),
            name: Set(field.name),
            value: Set(field.value),
            created_at: Set(now.clone()),
        };
        custom_fields.push(row.insert(db).await?);
    }

    Ok(EstimateWithChildren {
        estimate: saved,
        line_items,
        custom_fields,
    })
}

pub async fn delete_estimate(db: &DatabaseConnection, id: &str) -> Result<(), ServiceError> {
    let existing = Estimate::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;

    EstimateLineItem::update_many()
        .col_expr(estimate_line_item::Column::EstimateId, Expr::value(Value::String(None)))
        .filter(estimate_line_item::Column::EstimateId.eq(id))
        .exec(db)
        .await?;
    EstimateCustomField::update_many()
        .col_expr(estimate_custom_field::Column::EstimateId, Expr::value(Value::String(None)))
        .filter(estimate_custom_field::Column::EstimateId.eq(id))
        .exec(db)
        .await?;

    existing.delete(db).await?;
    Ok(())
}

pub async fn get_estimate(
    db: &DatabaseConnection,
    id: &str,
) -> Result<EstimateWithChildren, ServiceError> {
    let estimate = Estimate::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;
    let line_items = EstimateLineItem::find()
        .filter(estimate_line_item::Column::EstimateId.eq(id))
        .order_by_asc(estimate_line_item::Column::Position)
        .all(db)
        .await?;
    let custom_fields = EstimateCustomField::find()
        .filter(estimate_custom_field::Column::EstimateId.eq(id))
        .all(db)
        .await?;
    Ok(EstimateWithChildren {
        estimate,
        line_items,
        custom_fields,
    })
}
