//! File handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::header,
    response::Response,
    Json,
};

use crate::storage::StoredFile;
use crate::web::dto::{ApiResponse, MessageResponse, RenameRequest};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Build a Content-Disposition header value for a stored file.
///
/// Control characters are dropped and quotes/backslashes replaced in the
/// plain `filename` parameter. Anything that is not plain ASCII is also
/// sent as an RFC 5987 `filename*` parameter.
fn content_disposition_header(disposition: &str, filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename.chars().any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("{}; filename=\"{}\"", disposition, filename);
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition,
        sanitized,
        urlencoding::encode(filename)
    )
}

fn file_response(name: &str, content: Vec<u8>, disposition: &str) -> Result<Response, ApiError> {
    let content_type = if disposition == "attachment" {
        "application/octet-stream".to_string()
    } else {
        mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    };

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(disposition, name),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// GET /api/files - List the caller's files.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<StoredFile>>>, ApiError> {
    let files = state.files.list(&user.username)?;
    Ok(Json(ApiResponse::new(files)))
}

/// POST /api/files - Upload a file (multipart field `file`).
///
/// An existing file with the same name is overwritten.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::bad_request("No selected file"))?;
        let content = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read file content: {}", e);
            ApiError::bad_request("Failed to read file")
        })?;
        upload = Some((filename, content.to_vec()));
    }

    let (filename, content) = upload.ok_or_else(|| ApiError::bad_request("No file part"))?;
    if filename.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }

    state.files.save(&user.username, &filename, &content)?;

    Ok(Json(ApiResponse::new(MessageResponse::new(format!(
        "File {} uploaded",
        filename
    )))))
}

/// GET /api/files/:name - Serve a file inline for previewing.
pub async fn preview_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let content = state.files.read(&user.username, &name)?;
    file_response(&name, content, "inline")
}

/// GET /api/files/:name/download - Download a file as an attachment.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let content = state.files.read(&user.username, &name)?;
    file_response(&name, content, "attachment")
}

/// POST /api/files/rename - Rename a file.
pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<RenameRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .files
        .rename(&user.username, &req.old_name, &req.new_name)?;

    Ok(Json(ApiResponse::new(MessageResponse::new(format!(
        "File renamed from {} to {}",
        req.old_name, req.new_name
    )))))
}

/// DELETE /api/files/:name - Delete a file.
///
/// Deleting a file that does not exist succeeds.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let existed = state.files.delete(&user.username, &name)?;
    tracing::debug!(username = %user.username, name = %name, existed, "Delete requested");

    Ok(Json(ApiResponse::new(MessageResponse::new(format!(
        "File {} deleted",
        name
    )))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition_header("attachment", "report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition_header("inline", "a b.txt"),
            "inline; filename=\"a b.txt\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition_header("attachment", "résumé.txt");
        assert!(value.starts_with("attachment; filename=\"résumé.txt\"; filename*=UTF-8''"));
        assert!(value.ends_with("r%C3%A9sum%C3%A9.txt"));
    }

    #[test]
    fn test_content_disposition_quotes() {
        let value = content_disposition_header("attachment", "say \"hi\".txt");
        assert!(value.contains("filename=\"say _hi_.txt\""));
        assert!(value.contains("filename*=UTF-8''say%20%22hi%22.txt"));
    }

    #[test]
    fn test_file_response_types() {
        let inline = file_response("notes.txt", b"hi".to_vec(), "inline").unwrap();
        assert_eq!(
            inline.headers()[header::CONTENT_TYPE],
            "text/plain"
        );

        let attachment = file_response("notes.txt", b"hi".to_vec(), "attachment").unwrap();
        assert_eq!(
            attachment.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(attachment.headers()[header::CONTENT_LENGTH], "2");
    }
}
