//! Backup handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;

use crate::storage::{parse_snapshot_date, StoredFile};
use crate::web::dto::{ApiResponse, BackupCreatedResponse, MessageResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/backups - List the caller's snapshot dates, oldest first.
pub async fn list_backups(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<NaiveDate>>>, ApiError> {
    let dates = state.snapshots.list_snapshot_dates(&user.username)?;
    Ok(Json(ApiResponse::new(dates)))
}

/// POST /api/backups - Snapshot the caller's files under today's date.
pub async fn create_backup(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<BackupCreatedResponse>>), ApiError> {
    let date = state.snapshots.create_snapshot(&user.username)?;

    let response = BackupCreatedResponse {
        date,
        message: format!("Backup created for {}", date),
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::new(response))))
}

/// GET /api/backups/:date - List the files in one snapshot.
pub async fn backup_files(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(date): Path<String>,
) -> Result<Json<ApiResponse<Vec<StoredFile>>>, ApiError> {
    let date = parse_snapshot_date(&date)?;
    let files = state.snapshots.snapshot_files(&user.username, date)?;
    Ok(Json(ApiResponse::new(files)))
}

/// POST /api/backups/:date/restore - Replace the caller's files with a snapshot.
pub async fn restore_backup(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(date): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let date = parse_snapshot_date(&date)?;
    state.snapshots.restore(&user.username, date)?;

    Ok(Json(ApiResponse::new(MessageResponse::new(format!(
        "Backup from {} restored",
        date
    )))))
}
