//! Document upload, download and delete handlers.

use actix_multipart::Multipart;
use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH};
use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::{DocumentResponse, DocumentUploadForm};
use crate::services::Storage;
use crate::services::documents::{self, UploadLimits};

/// Build an attachment Content-Disposition with an ASCII fallback name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

/// Upload a CV or cover letter to the caller's application.
#[utoipa::path(
    post,
    path = "/api/v1/documents/upload",
    tag = "Documents",
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = DocumentResponse),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 403, description = "Not the applicant", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "File type not allowed", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn upload_document(
    req: HttpRequest,
    auth: AuthUser,
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    limits: web::Data<UploadLimits>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let declared_length = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(length) = declared_length
        && length > limits.max_request_size()
    {
        return Err(AppError::PayloadTooLarge(format!(
            "Request of {} bytes exceeds maximum document size {} bytes",
            length, limits.max_document_size
        )));
    }

    let upload = documents::read_upload(payload, limits.max_document_size).await?;
    let document =
        documents::store_document(&pool, &storage, &auth, upload, limits.max_document_size)
            .await?;

    Ok(HttpResponse::Created().json(DocumentResponse::from(document)))
}

/// Download a document.
///
/// When the recruiter who owns the offer downloads it, the application is
/// marked VIEWED in the same request.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{document_id}",
    tag = "Documents",
    params(("document_id" = Uuid, Path, description = "Document UUID")),
    responses(
        (status = 200, description = "Document bytes", content_type = "application/octet-stream"),
        (status = 403, description = "No access to this document", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_document(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let content = documents::fetch_document(&pool, &storage, &auth, path.into_inner()).await?;

    Ok(HttpResponse::Ok()
        .content_type(content.content_type)
        .insert_header((
            CONTENT_DISPOSITION,
            content_disposition(&content.document.file_name),
        ))
        .body(content.data))
}

/// Delete a document from the caller's application.
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{document_id}",
    tag = "Documents",
    params(("document_id" = Uuid, Path, description = "Document UUID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 403, description = "Not the applicant", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_document(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    documents::remove_document(&pool, &storage, &auth, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure document routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/documents/upload").route(web::post().to(upload_document)))
        .service(
            web::resource("/documents/{document_id}")
                .route(web::get().to(get_document))
                .route(web::delete().to(delete_document)),
        );
}
