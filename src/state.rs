//! Application state shared across all handlers

use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use std::sync::Arc;

use crate::services::{DbSettingsStore, SettingsStore};

#[derive(Clone)]
pub struct AppState {
    /// Database connection
    db: DatabaseConnection,
    /// Injected settings store
    pub settings: Arc<dyn SettingsStore>,
    /// Directory where backup files are written and listed
    pub backup_dir: PathBuf,
}

impl AppState {
    pub fn new(db: DatabaseConnection, backup_dir: PathBuf) -> Self {
        let settings = Arc::new(DbSettingsStore::new(db.clone()));
        Self {
            db,
            settings,
            backup_dir,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Allow extracting DatabaseConnection directly from AppState
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
