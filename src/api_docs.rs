use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::items::list_items,
        api::items::create_item,
        api::invoices::create_invoice,
        api::backup::export_backup,
        api::backup::import_backup,
        // Add other endpoints here as we document them
    ),
    tags(
        (name = "stockly", description = "Stockly API")
    )
)]
pub struct ApiDoc;
