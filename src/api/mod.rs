pub mod backup;
pub mod categories;
pub mod clients;
pub mod estimates;
pub mod health;
pub mod invoices;
pub mod items;
pub mod settings;
pub mod suppliers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Items
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/low-stock", get(items::list_low_stock))
        .route(
            "/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        // Categories (custom fields ride along with their category)
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        // Clients
        .route(
            "/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/clients/:id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        // Suppliers
        .route(
            "/suppliers",
            get(suppliers::list_suppliers).post(suppliers::create_supplier),
        )
        .route(
            "/suppliers/:id",
            get(suppliers::get_supplier)
                .put(suppliers::update_supplier)
                .delete(suppliers::delete_supplier),
        )
        // Invoices
        .route(
            "/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route(
            "/invoices/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        // Estimates
        .route(
            "/estimates",
            get(estimates::list_estimates).post(estimates::create_estimate),
        )
        .route(
            "/estimates/:id",
            get(estimates::get_estimate)
                .put(estimates::update_estimate)
                .delete(estimates::delete_estimate),
        )
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        // Backup & Restore
        .route("/backup/export", post(backup::export_backup))
        .route("/backup/import", post(backup::import_backup))
        .route("/backup/files", get(backup::list_backup_files))
        .route(
            "/backup/files/:file_name",
            get(backup::download_backup_file).delete(backup::delete_backup_file),
        )
        .with_state(state)
}
