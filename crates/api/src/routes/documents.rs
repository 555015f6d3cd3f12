//! Project document routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    AppState,
    error::{ApiError, db_err},
    middleware::auth::TenantContext,
};
use projextpal_core::policy::{Action, check_action};
use projextpal_core::storage::{StorageError, StorageService, UploadRequest};
use projextpal_db::{entities::documents, repositories::ProjectRepository};
use projextpal_shared::AppError;

/// Creates the document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents/upload-url", post(create_upload_url))
        .route("/documents/{id}/download-url", get(create_download_url))
}

/// Upload URL request payload.
#[derive(Debug, Deserialize)]
struct UploadUrlPayload {
    /// Target project.
    project_id: i64,
    /// Original filename.
    filename: String,
    /// MIME type of the file.
    content_type: String,
    /// File size in bytes.
    file_size: u64,
}

/// Download URL response.
#[derive(Debug, Serialize)]
struct DownloadUrlResponse {
    /// Presigned download URL.
    download_url: String,
    /// Original filename.
    filename: String,
    /// URL expiry.
    expires_at: chrono::DateTime<chrono::Utc>,
}

/// Upload URL response.
#[derive(Debug, Serialize)]
struct UploadUrlResponse {
    /// Created document row id.
    document_id: i64,
    /// Key the document lives under.
    storage_key: String,
    /// Presigned upload URL.
    upload_url: String,
    /// HTTP method for the upload.
    method: String,
    /// Headers the client must send.
    headers: HashMap<String, String>,
    /// URL expiry.
    expires_at: chrono::DateTime<chrono::Utc>,
}

/// Maps storage failures onto API errors. Size and MIME violations are the
/// caller's fault; everything else is the provider's.
fn storage_err(err: StorageError) -> ApiError {
    match &err {
        StorageError::FileTooLarge { .. } | StorageError::InvalidMimeType { .. } => {
            ApiError(AppError::Validation(err.to_string()))
        }
        _ => ApiError(AppError::UpstreamUnavailable(err.to_string())),
    }
}

/// POST /documents/upload-url - Creates the document row and presigns an
/// upload URL for it.
async fn create_upload_url(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Json(payload): Json<UploadUrlPayload>,
) -> Result<impl IntoResponse, ApiError> {
    check_action(&ctx, Action::WriteProject).map_err(AppError::from)?;

    let Some(storage) = &state.storage else {
        return Err(AppError::UpstreamUnavailable("file storage is not configured".into()).into());
    };

    let project = ProjectRepository::new((*state.db).clone())
        .find_scoped(&ctx, payload.project_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("project {}", payload.project_id)))?;

    // Validate before creating the row so rejected uploads leave nothing
    // behind.
    storage
        .validate_upload(&payload.content_type, payload.file_size)
        .map_err(storage_err)?;

    let file_size = i64::try_from(payload.file_size)
        .map_err(|_| ApiError(AppError::Validation("file size too large".into())))?;

    let now = chrono::Utc::now();
    let row = documents::ActiveModel {
        project_id: Set(project.id),
        uploaded_by: Set(Some(ctx.user_id)),
        filename: Set(payload.filename.clone()),
        content_type: Set(payload.content_type.clone()),
        file_size: Set(file_size),
        storage_key: Set(String::new()),
        provider: Set(storage.provider_name().to_string()),
        uploaded_on: Set(now.date_naive()),
        ..Default::default()
    };
    let row = row.insert(&*state.db).await.map_err(db_err)?;

    let request = UploadRequest {
        company_id: project.company_id,
        project_id: project.id,
        document_id: row.id,
        filename: payload.filename,
        content_type: payload.content_type,
        file_size: payload.file_size,
    };
    let storage_key = StorageService::storage_key(&request);

    let mut active: documents::ActiveModel = row.into();
    active.storage_key = Set(storage_key.clone());
    let row = active.update(&*state.db).await.map_err(db_err)?;

    let presigned = storage.presign_upload(&request).await.map_err(storage_err)?;

    Ok((
        StatusCode::CREATED,
        Json(UploadUrlResponse {
            document_id: row.id,
            storage_key,
            upload_url: presigned.url,
            method: presigned.method,
            headers: presigned.headers,
            expires_at: presigned.expires_at,
        }),
    ))
}

/// GET /documents/{id}/download-url - Presigns a download for an uploaded
/// document, tenant-guarded through its project.
async fn create_download_url(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<DownloadUrlResponse>, ApiError> {
    check_action(&ctx, Action::ReadProject).map_err(AppError::from)?;

    let Some(storage) = &state.storage else {
        return Err(AppError::UpstreamUnavailable("file storage is not configured".into()).into());
    };

    let document = documents::Entity::find_by_id(id)
        .one(&*state.db)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("document {id}")))?;

    ProjectRepository::new((*state.db).clone())
        .find_scoped(&ctx, document.project_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("document {id}")))?;

    if document.storage_key.is_empty() {
        return Err(AppError::NotFound(format!("document {id}")).into());
    }

    let presigned = storage
        .presign_download(&document.storage_key)
        .await
        .map_err(storage_err)?;

    Ok(Json(DownloadUrlResponse {
        download_url: presigned.url,
        filename: document.filename,
        expires_at: presigned.expires_at,
    }))
}
