use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::backup::{self, BackupError, ConflictPolicy};
use crate::state::AppState;

fn backup_error(e: BackupError) -> axum::response::Response {
    let status = match &e {
        BackupError::FileNotFound(_) => StatusCode::NOT_FOUND,
        BackupError::AccessDenied(_) => StatusCode::FORBIDDEN,
        BackupError::InvalidData
        | BackupError::CorruptedBackup
        | BackupError::DecodingFailed
        | BackupError::DecryptionFailed
        | BackupError::IncompatibleVersion { .. }
        | BackupError::MissingData(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    pub password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/backup/export",
    responses(
        (status = 200, description = "Backup file written")
    )
)]
pub async fn export_backup(
    State(state): State<AppState>,
    body: Option<Json<ExportRequest>>,
) -> impl IntoResponse {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let password = request.password.as_deref().filter(|p| !p.is_empty());

    match backup::export_all_data(
        state.db(),
        state.settings.as_ref(),
        &state.backup_dir,
        password,
    )
    .await
    {
        Ok(path) => Json(serde_json::json!({
            "file_name": path.file_name().map(|n| n.to_string_lossy().into_owned()),
            "path": path.display().to_string(),
            "encrypted": password.is_some(),
            "message": "Backup created successfully"
        }))
        .into_response(),
        Err(e) => backup_error(e),
    }
}

pub async fn list_backup_files(State(state): State<AppState>) -> impl IntoResponse {
    match backup::list_backups(&state.backup_dir) {
        Ok(backups) => Json(serde_json::json!({
            "backups": backups,
            "total": backups.len()
        }))
        .into_response(),
        Err(e) => backup_error(e),
    }
}

pub async fn delete_backup_file(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> impl IntoResponse {
    match backup::delete_backup(&state.backup_dir, &file_name) {
        Ok(()) => {
            Json(serde_json::json!({"message": "Backup deleted successfully"})).into_response()
        }
        Err(e) => backup_error(e),
    }
}

pub async fn download_backup_file(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> impl IntoResponse {
    if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "Invalid file name"})),
        )
            .into_response();
    }
    match tokio::fs::read(state.backup_dir.join(&file_name)).await {
        Ok(bytes) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                "application/octet-stream".parse().unwrap(),
            );
            if let Ok(disposition) =
                format!("attachment; filename=\"{}\"", file_name).parse()
            {
                headers.insert(header::CONTENT_DISPOSITION, disposition);
            }
            (StatusCode::OK, headers, bytes).into_response()
        }
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Backup file not found"})),
        )
            .into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/backup/import",
    responses(
        (status = 200, description = "Restore report with imported counts and skipped rows"),
        (status = 400, description = "Invalid, incompatible or undecryptable backup")
    )
)]
pub async fn import_backup(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut password: Option<String> = None;
    let mut policy = ConflictPolicy::Replace;

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        match field.name() {
            Some("file") => {
                file_bytes = field.bytes().await.ok().map(|b| b.to_vec());
            }
            Some("password") => {
                password = field.text().await.ok().filter(|p| !p.is_empty());
            }
            Some("mode") => {
                if let Ok(mode) = field.text().await {
                    if mode.eq_ignore_ascii_case("merge") {
                        policy = ConflictPolicy::Merge;
                    }
                }
            }
            _ => {}
        }
    }

    let Some(bytes) = file_bytes else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "No file uploaded"})),
        )
            .into_response();
    };

    let container = match backup::service::read_container(&bytes, password.as_deref()) {
        Ok(container) => container,
        Err(e) => return backup_error(e),
    };

    match crate::backup::restore::restore(state.db(), &container, policy).await {
        Ok(report) => Json(serde_json::json!({
            "report": report,
            "message": "Backup imported successfully"
        }))
        .into_response(),
        Err(e) => backup_error(e),
    }
}
