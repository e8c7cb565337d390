//! The versioned backup envelope.
//!
//! The container is always plain JSON; encryption wraps the serialized
//! bytes, never the structure. Entity sections are kept as raw JSON values
//! so one malformed row can be skipped without losing the rest.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::error::BackupError;

/// Highest container version this build can read.
pub const SCHEMA_VERSION: u32 = 2;

const BUILD_NUMBER: &str = "34";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub build_number: String,
    #[serde(default)]
    pub creation_date: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub encrypted: bool,
}

impl BackupMetadata {
    pub fn current(encrypted: bool) -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            build_number: BUILD_NUMBER.to_string(),
            creation_date: chrono::Utc::now().to_rfc3339(),
            platform: std::env::consts::OS.to_string(),
            encrypted,
        }
    }

    /// Synthesized for legacy files that carry no metadata section.
    pub fn unknown() -> Self {
        Self {
            app_version: String::new(),
            build_number: String::new(),
            creation_date: String::new(),
            platform: String::new(),
            encrypted: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupContainer {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BackupMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoices: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimates: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<BTreeMap<String, String>>,
}

impl BackupContainer {
    /// Parse raw bytes that are expected to be plaintext JSON.
    pub fn parse(bytes: &[u8]) -> Result<Self, BackupError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|_| BackupError::InvalidData)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON value as a container.
    pub fn from_value(value: Value) -> Result<Self, BackupError> {
        if !value.is_object() {
            return Err(BackupError::InvalidData);
        }
        // `version` must be present and an integer; everything else is optional
        let mut container: BackupContainer =
            serde_json::from_value(value).map_err(|_| BackupError::InvalidData)?;
        if container.version > SCHEMA_VERSION {
            return Err(BackupError::IncompatibleVersion {
                found: container.version,
                supported: SCHEMA_VERSION,
            });
        }
        if container.metadata.is_none() {
            container.metadata = Some(BackupMetadata::unknown());
        }
        Ok(container)
    }

    pub fn to_pretty_json(&self) -> Result<Vec<u8>, BackupError> {
        serde_json::to_vec_pretty(self).map_err(|_| BackupError::EncodingFailed)
    }

    pub fn is_encrypted(&self) -> bool {
        self.metadata.as_ref().map(|m| m.encrypted).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_versions_newer_than_supported() {
        let bytes = format!(r#"{{ "version": {} }}"#, SCHEMA_VERSION + 1);
        match BackupContainer::parse(bytes.as_bytes()) {
            Err(BackupError::IncompatibleVersion { found, supported }) => {
                assert_eq!(found, SCHEMA_VERSION + 1);
                assert_eq!(supported, SCHEMA_VERSION);
            }
            other => panic!("expected IncompatibleVersion, got {:?}", other),
        }
    }

    #[test]
    fn accepts_older_versions() {
        let container = BackupContainer::parse(br#"{ "version": 1 }"#).unwrap();
        assert_eq!(container.version, 1);
    }

    #[test]
    fn missing_version_is_invalid() {
        match BackupContainer::parse(br#"{ "items": [] }"#) {
            Err(BackupError::InvalidData) => {}
            other => panic!("expected InvalidData, got {:?}", other),
        }
    }

    #[test]
    fn non_object_is_invalid() {
        assert!(matches!(
            BackupContainer::parse(b"[1, 2, 3]"),
            Err(BackupError::InvalidData)
        ));
        assert!(matches!(
            BackupContainer::parse(b"not json at all"),
            Err(BackupError::InvalidData)
        ));
    }

    #[test]
    fn missing_metadata_is_synthesized() {
        let container = BackupContainer::parse(br#"{ "version": 2 }"#).unwrap();
        let metadata = container.metadata.unwrap();
        assert!(!metadata.encrypted);
        assert!(metadata.app_version.is_empty());
    }

    #[test]
    fn absent_sections_mean_nothing_to_restore() {
        let container = BackupContainer::parse(br#"{ "version": 2, "items": [] }"#).unwrap();
        assert!(container.items.is_some());
        assert!(container.categories.is_none());
        assert!(container.settings.is_none());
    }

    #[test]
    fn round_trips_through_pretty_json() {
        let container = BackupContainer {
            version: SCHEMA_VERSION,
            metadata: Some(BackupMetadata::current(false)),
            items: Some(vec![serde_json::json!({"id": "x", "name": "n", "sku": "s"})]),
            ..Default::default()
        };
        let bytes = container.to_pretty_json().unwrap();
        let parsed = BackupContainer::parse(&bytes).unwrap();
        assert_eq!(parsed.version, container.version);
        assert_eq!(parsed.items, container.items);
        assert!(parsed.clients.is_none());
    }
}
