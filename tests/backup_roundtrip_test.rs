use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serial_test::serial;
use std::path::PathBuf;

use stockly::backup::{self, BackupContainer, BackupError, ConflictPolicy, SCHEMA_VERSION};
use stockly::db;
use stockly::models::enums::{DiscountType, InvoiceStatus, MeasurementUnit};
use stockly::models::{category, category_custom_field, invoice, invoice_line_item, item};
use stockly::services::document_service::{
    self, CustomFieldDraft, EstimateDraft, InvoiceDraft, LineItemDraft,
};
use stockly::services::item_service::{self, ItemDraft};
use stockly::services::{DbSettingsStore, SettingsStore};

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    // In-memory SQLite for testing
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    db
}

fn item_draft(name: &str, sku: &str, barcode: Option<&str>) -> ItemDraft {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "sku": sku,
        "category": "Rings",
        "price": 249.99,
        "buy_price": 120.0,
        "stock_quantity": 3,
        "min_stock_level": 1,
        "tax_rate": 20.0,
        "barcode": barcode,
    }))
    .expect("valid item draft")
}

async fn seed_sample_data(db: &DatabaseConnection) {
    let store = DbSettingsStore::new(db.clone());

    // A category with a dropdown custom field
    let now = chrono::Utc::now().to_rfc3339();
    let cat = category::ActiveModel {
        id: Set("0b54f6a1-3a1f-4f2e-9d27-5f0f2b8a1c01".to_string()),
        name: Set("Rings".to_string()),
        description: Set(Some("Wedding and engagement rings".to_string())),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
    };
    cat.insert(db).await.expect("Failed to create category");

    let field = category_custom_field::ActiveModel {
        id: Set("0b54f6a1-3a1f-4f2e-9d27-5f0f2b8a1c11".to_string()),
        category_id: Set("0b54f6a1-3a1f-4f2e-9d27-5f0f2b8a1c01".to_string()),
        name: Set("Ring size".to_string()),
        kind: Set(stockly::models::CustomFieldKind::Dropdown),
        required: Set(true),
        options: Set(Some(r#"["52","54","56"]"#.to_string())),
        created_at: Set(now),
    };
    field.insert(db).await.expect("Failed to create custom field");

    // One item with a barcode, one without
    item_service::create_item(db, item_draft("Gold Ring", "RING-001", Some("4006381333931")))
        .await
        .expect("Failed to create item");
    item_service::create_item(db, item_draft("Silver Ring", "RING-002", None))
        .await
        .expect("Failed to create item");

    // An invoice with three line items and a custom field
    let draft = InvoiceDraft {
        number: None,
        client_name: "Claire Dubois".to_string(),
        client_address: Some("12 Rue des Orfevres, Lyon".to_string()),
        client_email: Some("claire@example.com".to_string()),
        client_phone: None,
        status: InvoiceStatus::Sent,
        issue_date: None,
        due_date: None,
        discount_type: DiscountType::Percentage,
        discount_value: 10.0,
        tax_rate: 8.0,
        notes: None,
        line_items: vec![
            LineItemDraft {
                name: "Gold Ring".to_string(),
                description: None,
                quantity: 1.0,
                unit_price: 60.0,
                tax_rate: 0.0,
                discount: 0.0,
            },
            LineItemDraft {
                name: "Engraving".to_string(),
                description: Some("Inner band".to_string()),
                quantity: 1.0,
                unit_price: 25.0,
                tax_rate: 0.0,
                discount: 0.0,
            },
            LineItemDraft {
                name: "Gift box".to_string(),
                description: None,
                quantity: 1.0,
                unit_price: 15.0,
                tax_rate: 0.0,
                discount: 0.0,
            },
        ],
        custom_fields: vec![CustomFieldDraft {
            name: "Order source".to_string(),
            value: "In store".to_string(),
        }],
    };
    document_service::create_invoice(db, &store, draft)
        .await
        .expect("Failed to create invoice");

    // One estimate so every family is populated
    let estimate = EstimateDraft {
        number: None,
        client_name: "Walk-in".to_string(),
        client_address: None,
        client_email: None,
        client_phone: None,
        status: Default::default(),
        issue_date: None,
        expiry_date: None,
        discount_type: DiscountType::Fixed,
        discount_value: 5.0,
        tax_rate: 0.0,
        notes: None,
        line_items: vec![LineItemDraft {
            name: "Resizing".to_string(),
            description: None,
            quantity: 1.0,
            unit_price: 40.0,
            tax_rate: 0.0,
            discount: 0.0,
        }],
        custom_fields: vec![],
    };
    document_service::create_estimate(db, &store, estimate)
        .await
        .expect("Failed to create estimate");
}

fn temp_backup_dir() -> PathBuf {
    std::env::temp_dir().join(format!("stockly-test-{}", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn round_trip_preserves_entities_and_optional_fields() {
    let source = setup_test_db().await;
    seed_sample_data(&source).await;
    let store = DbSettingsStore::new(source.clone());

    let container = backup::service::build_container(&source, &store, false)
        .await
        .expect("Failed to build container");
    let bytes = container.to_pretty_json().expect("Failed to serialize");
    let parsed = BackupContainer::parse(&bytes).expect("Failed to parse");
    assert_eq!(parsed.version, SCHEMA_VERSION);
    assert!(!parsed.is_encrypted());

    let target = setup_test_db().await;
    let report = backup::restore::restore(&target, &parsed, ConflictPolicy::Replace)
        .await
        .expect("Restore failed");
    assert!(report.skipped.is_empty(), "unexpected skips: {:?}", report.skipped);
    assert_eq!(report.imported["items"], 2);
    assert_eq!(report.imported["categories"], 1);
    assert_eq!(report.imported["invoices"], 1);
    assert_eq!(report.imported["estimates"], 1);

    // Optional fields survive exactly as they were
    let with_barcode = item::Entity::find()
        .filter(item::Column::Sku.eq("RING-001"))
        .one(&target)
        .await
        .unwrap()
        .expect("item missing after restore");
    assert_eq!(with_barcode.barcode.as_deref(), Some("4006381333931"));
    assert_eq!(with_barcode.name, "Gold Ring");
    assert_eq!(with_barcode.measurement_unit, MeasurementUnit::Piece);

    let without_barcode = item::Entity::find()
        .filter(item::Column::Sku.eq("RING-002"))
        .one(&target)
        .await
        .unwrap()
        .expect("item missing after restore");
    assert!(without_barcode.barcode.is_none());

    // Category custom fields are nested through the wire and come back owned
    let fields = category_custom_field::Entity::find()
        .all(&target)
        .await
        .unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].category_id, "0b54f6a1-3a1f-4f2e-9d27-5f0f2b8a1c01");

    // Settings travel as a flat map
    let target_store = DbSettingsStore::new(target.clone());
    assert_eq!(
        target_store.get("currency").await.unwrap().as_deref(),
        Some("USD")
    );
}

#[tokio::test]
async fn restored_invoice_relinks_children_and_recomputes_totals() {
    let source = setup_test_db().await;
    seed_sample_data(&source).await;
    let store = DbSettingsStore::new(source.clone());

    let container = backup::service::build_container(&source, &store, false)
        .await
        .unwrap();
    let target = setup_test_db().await;
    backup::restore::restore(&target, &container, ConflictPolicy::Replace)
        .await
        .unwrap();

    let restored = invoice::Entity::find()
        .one(&target)
        .await
        .unwrap()
        .expect("invoice missing after restore");
    let lines = invoice_line_item::Entity::find()
        .filter(invoice_line_item::Column::InvoiceId.eq(&restored.id))
        .order_by_asc(invoice_line_item::Column::Position)
        .all(&target)
        .await
        .unwrap();

    // Every child points back at the freshly created parent
    assert_eq!(lines.len(), 3);
    for line in &lines {
        assert_eq!(line.invoice_id.as_deref(), Some(restored.id.as_str()));
    }
    assert_eq!(lines[0].name, "Gold Ring");
    assert_eq!(lines[2].name, "Gift box");

    // subtotal 100, 10% discount, 8% tax on the remainder
    assert!((restored.subtotal - 100.0).abs() < 1e-9);
    assert!((restored.discount_amount - 10.0).abs() < 1e-9);
    assert!((restored.tax_amount - 7.2).abs() < 1e-9);
    assert!((restored.total - 97.2).abs() < 1e-9);
}

#[tokio::test]
async fn malformed_rows_are_skipped_not_fatal() {
    let mut clients = Vec::new();
    for i in 0..9 {
        clients.push(serde_json::json!({
            "id": format!("4d7e1f32-8c4a-4b6d-9e5f-aa01b2c3d4{:02}", i),
            "name": format!("Client {}", i),
        }));
    }
    // Row without the required name field
    clients.push(serde_json::json!({
        "id": "4d7e1f32-8c4a-4b6d-9e5f-aa01b2c3d499"
    }));

    let container = BackupContainer::from_value(serde_json::json!({
        "version": SCHEMA_VERSION,
        "clients": clients,
    }))
    .unwrap();

    let db = setup_test_db().await;
    let report = backup::restore::restore(&db, &container, ConflictPolicy::Replace)
        .await
        .expect("Restore failed");

    assert_eq!(report.imported["clients"], 9);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].section, "clients");
    assert_eq!(report.skipped[0].index, 9);
}

#[tokio::test]
async fn newer_container_versions_are_rejected() {
    let bytes = serde_json::to_vec(&serde_json::json!({
        "version": SCHEMA_VERSION + 1,
        "items": [],
    }))
    .unwrap();

    match BackupContainer::parse(&bytes) {
        Err(BackupError::IncompatibleVersion { found, supported }) => {
            assert_eq!(found, SCHEMA_VERSION + 1);
            assert_eq!(supported, SCHEMA_VERSION);
        }
        other => panic!("expected IncompatibleVersion, got {:?}", other),
    }
}

#[tokio::test]
async fn merge_keeps_unrelated_rows_and_reports_sku_conflicts() {
    let source = setup_test_db().await;
    seed_sample_data(&source).await;
    let store = DbSettingsStore::new(source.clone());
    let container = backup::service::build_container(&source, &store, false)
        .await
        .unwrap();

    // Target already owns an item that is not in the backup, plus one whose
    // SKU collides with a backup row under a different id
    let target = setup_test_db().await;
    item_service::create_item(&target, item_draft("Local Only", "LOCAL-001", None))
        .await
        .unwrap();
    item_service::create_item(&target, item_draft("Conflicting", "RING-001", None))
        .await
        .unwrap();

    let report = backup::restore::restore(&target, &container, ConflictPolicy::Merge)
        .await
        .unwrap();

    // RING-001 from the backup is skipped (conflicting local id owns the SKU),
    // RING-002 lands, LOCAL-001 survives
    assert_eq!(report.imported["items"], 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("RING-001"));

    let all = item::Entity::find().all(&target).await.unwrap();
    let skus: Vec<&str> = all.iter().map(|i| i.sku.as_str()).collect();
    assert!(skus.contains(&"LOCAL-001"));
    assert!(skus.contains(&"RING-001"));
    assert!(skus.contains(&"RING-002"));

    // Replace clears the family instead
    let report = backup::restore::restore(&target, &container, ConflictPolicy::Replace)
        .await
        .unwrap();
    assert_eq!(report.imported["items"], 2);
    let all = item::Entity::find().all(&target).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
#[serial]
async fn export_writes_a_backup_file_that_imports_cleanly() {
    let source = setup_test_db().await;
    seed_sample_data(&source).await;
    let store = DbSettingsStore::new(source.clone());
    let dir = temp_backup_dir();

    let path = backup::export_all_data(&source, &store, &dir, None)
        .await
        .expect("Export failed");
    assert_eq!(
        path.extension().and_then(|e| e.to_str()),
        Some(backup::BACKUP_EXTENSION)
    );

    let listed = backup::list_backups(&dir).expect("Failed to list backups");
    assert_eq!(listed.len(), 1);
    assert!(listed[0].size_bytes > 0);

    let target = setup_test_db().await;
    let report = backup::import_all_data(&target, &path, None, ConflictPolicy::Replace)
        .await
        .expect("Import failed");
    assert_eq!(report.imported["items"], 2);

    let file_name = listed[0].file_name.clone();
    backup::delete_backup(&dir, &file_name).expect("Failed to delete backup");
    assert!(backup::list_backups(&dir).unwrap().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
#[serial]
async fn encrypted_export_requires_the_right_password() {
    let source = setup_test_db().await;
    seed_sample_data(&source).await;
    let store = DbSettingsStore::new(source.clone());
    let dir = temp_backup_dir();

    let path = backup::export_all_data(&source, &store, &dir, Some("correct-horse"))
        .await
        .expect("Export failed");

    // The file on disk is not JSON
    let raw = std::fs::read(&path).unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&raw).is_err());

    let target = setup_test_db().await;

    // No password: the importer detects encryption and asks for one
    match backup::import_all_data(&target, &path, None, ConflictPolicy::Replace).await {
        Err(BackupError::ImportFailed(reason)) => assert!(reason.contains("password")),
        other => panic!("expected ImportFailed, got {:?}", other),
    }

    // Wrong password fails without an oracle
    match backup::import_all_data(
        &target,
        &path,
        Some("wrong-password"),
        ConflictPolicy::Replace,
    )
    .await
    {
        Err(BackupError::DecryptionFailed) => {}
        other => panic!("expected DecryptionFailed, got {:?}", other),
    }

    // Right password restores everything
    let report = backup::import_all_data(
        &target,
        &path,
        Some("correct-horse"),
        ConflictPolicy::Replace,
    )
    .await
    .expect("Import failed");
    assert_eq!(report.imported["items"], 2);
    assert_eq!(report.imported["invoices"], 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn deleting_an_invoice_detaches_children() {
    let db = setup_test_db().await;
    seed_sample_data(&db).await;

    let existing = invoice::Entity::find().one(&db).await.unwrap().unwrap();
    document_service::delete_invoice(&db, &existing.id)
        .await
        .expect("Delete failed");

    // Children are detached, not deleted
    let orphans = invoice_line_item::Entity::find().all(&db).await.unwrap();
    assert_eq!(orphans.len(), 3);
    for line in orphans {
        assert!(line.invoice_id.is_none());
    }
}

#[tokio::test]
async fn duplicate_skus_inside_a_backup_are_skipped() {
    let items = vec![
        serde_json::json!({
            "id": "9e8d7c60-1a2b-4c3d-8e9f-010203040501",
            "name": "First",
            "sku": "DUP-001",
        }),
        serde_json::json!({
            "id": "9e8d7c60-1a2b-4c3d-8e9f-010203040502",
            "name": "Second",
            "sku": "DUP-001",
        }),
    ];
    let container = BackupContainer::from_value(serde_json::json!({
        "version": SCHEMA_VERSION,
        "items": items,
    }))
    .unwrap();

    let db = setup_test_db().await;
    let report = backup::restore::restore(&db, &container, ConflictPolicy::Replace)
        .await
        .unwrap();
    assert_eq!(report.imported["items"], 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("duplicate sku"));
}
