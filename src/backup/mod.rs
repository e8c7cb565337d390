//! Backup pipeline: typed entity records in a versioned JSON container,
//! optionally sealed with password-based authenticated encryption.

pub mod container;
pub mod crypto;
pub mod error;
pub mod records;
pub mod restore;
pub mod service;

pub use container::{BackupContainer, BackupMetadata, SCHEMA_VERSION};
pub use error::BackupError;
pub use restore::{ConflictPolicy, RestoreReport, SkippedRow};
pub use service::{
    delete_backup, export_all_data, import_all_data, list_backups, BackupFileInfo,
    BACKUP_EXTENSION,
};
