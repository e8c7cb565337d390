//! Backup error types
//!
//! Structural failures abort the whole export/import; per-row failures are
//! recovered into the restore report and never surface here.

use std::fmt;

#[derive(Debug)]
pub enum BackupError {
    ExportFailed(String),
    ImportFailed(String),
    /// Container could not be serialized to JSON
    EncodingFailed,
    /// Decrypted payload could not be decoded as UTF-8 JSON
    DecodingFailed,
    FileCreationFailed(String),
    /// Bytes parse as JSON but not as a backup container
    InvalidData,
    FileNotFound(String),
    AccessDenied(String),
    EncryptionFailed,
    /// Wrong password, tampered data or malformed blob - deliberately
    /// indistinguishable
    DecryptionFailed,
    KeyDerivationFailed,
    IncompatibleVersion { found: u32, supported: u32 },
    MissingData(String),
    CorruptedBackup,
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupError::ExportFailed(reason) => write!(f, "Export failed: {}", reason),
            BackupError::ImportFailed(reason) => write!(f, "Import failed: {}", reason),
            BackupError::EncodingFailed => write!(f, "Failed to encode backup data"),
            BackupError::DecodingFailed => write!(f, "Failed to decode backup data"),
            BackupError::FileCreationFailed(reason) => {
                write!(f, "Failed to create backup file: {}", reason)
            }
            BackupError::InvalidData => write!(f, "Backup data is not a valid container"),
            BackupError::FileNotFound(path) => write!(f, "Backup file not found: {}", path),
            BackupError::AccessDenied(path) => write!(f, "Access denied: {}", path),
            BackupError::EncryptionFailed => write!(f, "Encryption failed"),
            BackupError::DecryptionFailed => {
                write!(f, "Decryption failed: wrong password or corrupted data")
            }
            BackupError::KeyDerivationFailed => write!(f, "Key derivation failed"),
            BackupError::IncompatibleVersion { found, supported } => write!(
                f,
                "Backup version {} is newer than the supported version {}",
                found, supported
            ),
            BackupError::MissingData(field) => write!(f, "Missing data: {}", field),
            BackupError::CorruptedBackup => write!(f, "Backup file is corrupted"),
        }
    }
}

impl std::error::Error for BackupError {}

// Store errors during restore surface as import failures; export paths map
// explicitly to ExportFailed.
impl From<sea_orm::DbErr> for BackupError {
    fn from(e: sea_orm::DbErr) -> Self {
        BackupError::ImportFailed(format!("database error: {}", e))
    }
}
