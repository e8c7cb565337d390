use sea_orm::*;

use crate::models::enums::{
    CustomFieldKind, DiscountType, EstimateStatus, InvoiceStatus, MeasurementUnit,
};
use crate::models::{
    category, category_custom_field, client, estimate, estimate_line_item, invoice,
    invoice_line_item, item, supplier,
};
use crate::services::totals;

// Fixed ids keep the seed idempotent across restarts
const RINGS_CATEGORY_ID: &str = "0b54f6a1-3a1f-4f2e-9d27-5f0f2b8a1c01";
const NECKLACES_CATEGORY_ID: &str = "0b54f6a1-3a1f-4f2e-9d27-5f0f2b8a1c02";
const DEMO_CLIENT_ID: &str = "4d7e1f32-8c4a-4b6d-9e5f-aa01b2c3d401";
const DEMO_SUPPLIER_ID: &str = "4d7e1f32-8c4a-4b6d-9e5f-aa01b2c3d402";
const DEMO_INVOICE_ID: &str = "7c2a9b10-6d3e-4f5a-8b7c-dd01e2f3a501";
const DEMO_ESTIMATE_ID: &str = "7c2a9b10-6d3e-4f5a-8b7c-dd01e2f3a502";

/// Ok(true) when the row was inserted, Ok(false) when it already existed.
fn inserted(res: Result<InsertResult<impl ActiveModelTrait>, DbErr>) -> Result<bool, DbErr> {
    match res {
        Ok(_) => Ok(true),
        Err(DbErr::RecordNotInserted) => Ok(false),
        Err(e) => Err(e),
    }
}

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();

    // 1. Categories with custom fields
    let categories = vec![
        (RINGS_CATEGORY_ID, "Rings", "Wedding and engagement rings"),
        (NECKLACES_CATEGORY_ID, "Necklaces", "Chains and pendants"),
    ];
    for (id, name, description) in categories {
        let row = category::ActiveModel {
            id: Set(id.to_owned()),
            name: Set(name.to_owned()),
            description: Set(Some(description.to_owned())),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
        };
        let res = category::Entity::insert(row)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(category::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;
        inserted(res)?;
    }

    let ring_size_field = category_custom_field::ActiveModel {
        id: Set("0b54f6a1-3a1f-4f2e-9d27-5f0f2b8a1c11".to_owned()),
        category_id: Set(RINGS_CATEGORY_ID.to_owned()),
        name: Set("Ring size".to_owned()),
        kind: Set(CustomFieldKind::Dropdown),
        required: Set(true),
        options: Set(Some(r#"["52","54","56","58","60"]"#.to_owned())),
        created_at: Set(now.clone()),
    };
    let res = category_custom_field::Entity::insert(ring_size_field)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(category_custom_field::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;
    inserted(res)?;

    // 2. Items
    let items = vec![
        (
            "9e8d7c60-1a2b-4c3d-8e9f-010203040501",
            "Gold Wedding Band",
            "RING-0001",
            "Rings",
            349.0,
            180.0,
            4,
            Some("4006381333931"),
        ),
        (
            "9e8d7c60-1a2b-4c3d-8e9f-010203040502",
            "Silver Pendant Necklace",
            "NECK-0001",
            "Necklaces",
            129.5,
            60.0,
            7,
            None,
        ),
        (
            "9e8d7c60-1a2b-4c3d-8e9f-010203040503",
            "Diamond Solitaire Ring",
            "RING-0002",
            "Rings",
            1899.0,
            950.0,
            1,
            Some("4006381333948"),
        ),
    ];
    for (id, name, sku, cat, price, buy_price, stock, barcode) in items {
        let row = item::ActiveModel {
            id: Set(id.to_owned()),
            name: Set(name.to_owned()),
            description: Set(String::new()),
            category: Set(cat.to_owned()),
            sku: Set(sku.to_owned()),
            price: Set(price),
            buy_price: Set(buy_price),
            stock_quantity: Set(stock),
            min_stock_level: Set(1),
            measurement_unit: Set(MeasurementUnit::Piece),
            tax_rate: Set(20.0),
            barcode: Set(barcode.map(str::to_owned)),
            image_data: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            inventory_added_at: Set(now.clone()),
        };
        let res = item::Entity::insert(row)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(item::Column::Sku)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;
        inserted(res)?;
    }

    // 3. A client and a supplier
    let demo_client = client::ActiveModel {
        id: Set(DEMO_CLIENT_ID.to_owned()),
        name: Set("Claire Dubois".to_owned()),
        email: Set(Some("claire@example.com".to_owned())),
        phone: Set(Some("+33 6 12 34 56 78".to_owned())),
        address: Set(Some("12 Rue des Orfevres".to_owned())),
        city: Set(Some("Lyon".to_owned())),
        postal_code: Set(Some("69002".to_owned())),
        country: Set(Some("France".to_owned())),
        notes: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
    };
    let res = client::Entity::insert(demo_client)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(client::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;
    inserted(res)?;

    let demo_supplier = supplier::ActiveModel {
        id: Set(DEMO_SUPPLIER_ID.to_owned()),
        name: Set("Aurum Wholesale".to_owned()),
        email: Set(Some("orders@aurum.example".to_owned())),
        phone: Set(None),
        address: Set(Some("3 Goldsmith Lane".to_owned())),
        city: Set(Some("Antwerp".to_owned())),
        postal_code: Set(None),
        country: Set(Some("Belgium".to_owned())),
        notes: Set(Some("Net 30 payment terms".to_owned())),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
    };
    let res = supplier::Entity::insert(demo_supplier)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(supplier::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;
    inserted(res)?;

    // 4. One invoice with line items, totals derived the same way the
    // document service derives them
    let line_specs = [
        ("Gold Wedding Band", 1.0, 349.0),
        ("Engraving", 1.0, 25.0),
        ("Gift box", 1.0, 12.0),
    ];
    let line_totals: Vec<f64> = line_specs
        .iter()
        .map(|(_, qty, price)| totals::line_total(*qty, *price, 0.0, 0.0))
        .collect();
    let doc = totals::document_totals(&line_totals, DiscountType::Percentage, 0.0, 20.0);

    let demo_invoice = invoice::ActiveModel {
        id: Set(DEMO_INVOICE_ID.to_owned()),
        number: Set("INV-0001".to_owned()),
        client_name: Set("Claire Dubois".to_owned()),
        client_address: Set(Some("12 Rue des Orfevres, 69002 Lyon".to_owned())),
        client_email: Set(Some("claire@example.com".to_owned())),
        client_phone: Set(None),
        status: Set(InvoiceStatus::Sent),
        issue_date: Set(now.clone()),
        due_date: Set(None),
        discount_type: Set(DiscountType::Percentage),
        discount_value: Set(0.0),
        tax_rate: Set(20.0),
        subtotal: Set(doc.subtotal),
        discount_amount: Set(doc.discount_amount),
        tax_amount: Set(doc.tax_amount),
        total: Set(doc.total),
        notes: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
    };
    let invoice_res = invoice::Entity::insert(demo_invoice)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(invoice::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;

    // Line items only on first run; a conflict means the invoice was seeded before
    if inserted(invoice_res)? {
        for (position, ((name, qty, price), total)) in
            line_specs.iter().zip(line_totals).enumerate()
        {
            let row = invoice_line_item::ActiveModel {
                id: Set(format!("7c2a9b10-6d3e-4f5a-8b7c-dd01e2f3a5{:02}", position + 10)),
                invoice_id: Set(Some(DEMO_INVOICE_ID.to_owned())),
                position: Set(position as i32),
                name: Set((*name).to_owned()),
                description: Set(None),
                quantity: Set(*qty),
                unit_price: Set(*price),
                tax_rate: Set(0.0),
                discount: Set(0.0),
                total: Set(total),
                created_at: Set(now.clone()),
            };
            let res = invoice_line_item::Entity::insert(row)
                .on_conflict(
                    sea_orm::sea_query::OnConflict::column(invoice_line_item::Column::Id)
                        .do_nothing()
                        .to_owned(),
                )
                .exec(db)
                .await;
            inserted(res)?;
        }
    }

    // 5. One estimate
    let resize_total = totals::line_total(1.0, 45.0, 0.0, 0.0);
    let est = totals::document_totals(&[resize_total], DiscountType::Fixed, 5.0, 0.0);

    let demo_estimate = estimate::ActiveModel {
        id: Set(DEMO_ESTIMATE_ID.to_owned()),
        number: Set("EST-0001".to_owned()),
        client_name: Set("Walk-in".to_owned()),
        client_address: Set(None),
        client_email: Set(None),
        client_phone: Set(None),
        status: Set(EstimateStatus::Draft),
        issue_date: Set(now.clone()),
        expiry_date: Set(None),
        discount_type: Set(DiscountType::Fixed),
        discount_value: Set(5.0),
        tax_rate: Set(0.0),
        subtotal: Set(est.subtotal),
        discount_amount: Set(est.discount_amount),
        tax_amount: Set(est.tax_amount),
        total: Set(est.total),
        notes: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
    };
    let estimate_res = estimate::Entity::insert(demo_estimate)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(estimate::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;

    if inserted(estimate_res)? {
        let row = estimate_line_item::ActiveModel {
            id: Set("7c2a9b10-6d3e-4f5a-8b7c-dd01e2f3a520".to_owned()),
            estimate_id: Set(Some(DEMO_ESTIMATE_ID.to_owned())),
            position: Set(0),
            name: Set("Ring resizing".to_owned()),
            description: Set(None),
            quantity: Set(1.0),
            unit_price: Set(45.0),
            tax_rate: Set(0.0),
            discount: Set(0.0),
            total: Set(resize_total),
            created_at: Set(now.clone()),
        };
        let res = estimate_line_item::Entity::insert(row)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(estimate_line_item::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await;
        inserted(res)?;
    }

    Ok(())
}
