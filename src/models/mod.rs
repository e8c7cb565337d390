pub mod enums;

pub mod app_setting;
pub mod category;
pub mod category_custom_field;
pub mod client;
pub mod estimate;
pub mod estimate_custom_field;
pub mod estimate_line_item;
pub mod invoice;
pub mod invoice_custom_field;
pub mod invoice_line_item;
pub mod item;
pub mod supplier;

pub use enums::{CustomFieldKind, DiscountType, EstimateStatus, InvoiceStatus, MeasurementUnit};
