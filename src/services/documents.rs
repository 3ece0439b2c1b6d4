//! Document store: multipart upload, download and delete of CVs and
//! cover letters.

use actix_multipart::{Field, Multipart};
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::db::documents::NewDocument;
use crate::error::{AppError, AppResult};
use crate::models::{
    ApplicationDocument, ApplicationStatus, DocumentRejection, DocumentType, Role,
    validate_document_upload,
};
use crate::services::storage::Storage;
use crate::services::workflow::{ApplicationAccess, authorize_application, load_application};

/// Upper bound for non-file form fields.
const MAX_FIELD_SIZE: usize = 1024;

/// Multipart slack allowed on top of the document limit (boundaries, headers
/// and the small form fields).
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Size limit applied to document uploads.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_document_size: usize,
}

impl UploadLimits {
    /// Largest request body accepted before reading the multipart stream.
    pub fn max_request_size(&self) -> usize {
        self.max_document_size + MULTIPART_OVERHEAD
    }
}

/// A multipart upload read into memory.
#[derive(Debug)]
pub struct ParsedUpload {
    pub application_id: Uuid,
    pub document_type: DocumentType,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A document with its bytes, ready to be served.
#[derive(Debug)]
pub struct DocumentContent {
    pub document: ApplicationDocument,
    pub data: Vec<u8>,
    pub content_type: String,
}

impl From<DocumentRejection> for AppError {
    fn from(rejection: DocumentRejection) -> Self {
        match rejection {
            DocumentRejection::TooLarge { .. } => AppError::PayloadTooLarge(rejection.to_string()),
            DocumentRejection::ExtensionNotAllowed(_)
            | DocumentRejection::MimeTypeNotAllowed(_) => {
                AppError::UnsupportedMediaType(rejection.to_string())
            }
            DocumentRejection::Empty | DocumentRejection::InvalidFileName => {
                AppError::InvalidInput(rejection.to_string())
            }
        }
    }
}

async fn read_text_field(field: &mut Field, name: &str) -> AppResult<String> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
        data.extend_from_slice(&chunk);
        if data.len() > MAX_FIELD_SIZE {
            return Err(AppError::InvalidInput(format!("Field '{}' is too long", name)));
        }
    }
    String::from_utf8(data)
        .map(|s| s.trim().to_string())
        .map_err(|_| AppError::InvalidInput(format!("Field '{}' is not valid UTF-8", name)))
}

/// Read the `file`, `applicationId` and `documentType` fields.
///
/// The file stream is aborted with 413 as soon as it exceeds `max_size`.
pub async fn read_upload(mut payload: Multipart, max_size: usize) -> AppResult<ParsedUpload> {
    let mut application_id: Option<Uuid> = None;
    let mut document_type: Option<DocumentType> = None;
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;

        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "applicationId" | "application_id" => {
                let value = read_text_field(&mut field, &field_name).await?;
                application_id = Some(Uuid::parse_str(&value)?);
            }
            "documentType" | "document_type" | "type" => {
                let value = read_text_field(&mut field, &field_name).await?;
                document_type = Some(DocumentType::parse(&value).ok_or_else(|| {
                    AppError::InvalidInput(format!(
                        "Unknown document type '{}'. Expected CV or COVER_LETTER",
                        value
                    ))
                })?);
            }
            "file" => {
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string)
                    .ok_or_else(|| AppError::InvalidInput("Missing filename".to_string()))?;
                let content_type = field.content_type().map(|m| m.essence_str().to_string());

                let mut data = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk =
                        chunk.map_err(|e| AppError::InvalidInput(format!("Read error: {}", e)))?;
                    if data.len() + chunk.len() > max_size {
                        return Err(AppError::PayloadTooLarge(format!(
                            "File exceeds maximum {} bytes",
                            max_size
                        )));
                    }
                    data.extend_from_slice(&chunk);
                }
                file = Some((file_name, content_type, data));
            }
            other => {
                // Drain unknown fields
                while let Some(chunk) = field.next().await {
                    let _ = chunk;
                }
                warn!("Ignoring unknown multipart field '{}'", other);
            }
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::InvalidInput("Missing 'file' field".to_string()))?;

    Ok(ParsedUpload {
        application_id: application_id
            .ok_or_else(|| AppError::InvalidInput("Missing 'applicationId' field".to_string()))?,
        document_type: document_type
            .ok_or_else(|| AppError::InvalidInput("Missing 'documentType' field".to_string()))?,
        file_name,
        content_type,
        data,
    })
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Validate and store an upload for the caller's own application.
///
/// A document of the same type already on the application is replaced and
/// its stored object removed.
pub async fn store_document(
    db: &DbPool,
    storage: &Storage,
    caller: &AuthUser,
    upload: ParsedUpload,
    max_size: usize,
) -> AppResult<ApplicationDocument> {
    caller.require_role(&[Role::Applicant])?;

    let application = load_application(db, upload.application_id).await?;
    if application.user_id != caller.user_id {
        return Err(AppError::Forbidden(
            "You can only upload documents to your own applications".to_string(),
        ));
    }

    let validated = validate_document_upload(
        &upload.file_name,
        upload.content_type.as_deref(),
        upload.data.len() as u64,
        max_size as u64,
    )?;

    let document_id = Uuid::now_v7();
    let storage_key = Storage::document_key(application.id, document_id, &validated.extension);
    let sha256 = sha256_hex(&upload.data);
    let file_size = upload.data.len() as i64;

    storage
        .put(&storage_key, upload.data, Some(&validated.content_type))
        .await?;

    let record = NewDocument {
        id: document_id,
        application_id: application.id,
        document_type: upload.document_type,
        file_name: validated.file_name,
        file_size,
        content_type: validated.content_type,
        storage_key: storage_key.clone(),
        sha256,
    };

    let (document, replaced_key) = match db.replace_document(record).await {
        Ok(result) => result,
        Err(e) => {
            if let Err(cleanup) = storage.delete(&storage_key).await {
                warn!("Failed to remove orphaned object {}: {}", storage_key, cleanup);
            }
            return Err(e);
        }
    };

    if let Some(old_key) = replaced_key
        && old_key != storage_key
    {
        if let Err(e) = storage.delete(&old_key).await {
            warn!("Failed to delete replaced document {}: {}", old_key, e);
        }
    }

    info!(
        "Document {} ({}, {} bytes) stored for application {}",
        document.id, document.document_type, document.file_size, application.id
    );
    Ok(document)
}

/// Fetch a document's bytes.
///
/// When the recruiter who owns the offer reads it, the application moves to
/// VIEWED before the bytes are returned; a failed status write fails the read.
pub async fn fetch_document(
    db: &DbPool,
    storage: &Storage,
    caller: &AuthUser,
    document_id: Uuid,
) -> AppResult<DocumentContent> {
    let document = db
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {}", document_id)))?;
    let application = load_application(db, document.application_id).await?;
    let access = authorize_application(db, caller, &application).await?;

    let (data, stored_type) = storage.get(&document.storage_key).await?;

    if access == ApplicationAccess::Recruiter
        && application.status == ApplicationStatus::NotViewed
        && db.mark_application_viewed(application.id).await?
    {
        info!(
            "Application {} marked VIEWED by recruiter {} (document download)",
            application.id, caller.user_id
        );
    }

    let content_type = if document.content_type.is_empty() {
        stored_type.unwrap_or_else(|| "application/octet-stream".to_string())
    } else {
        document.content_type.clone()
    };

    Ok(DocumentContent {
        document,
        data,
        content_type,
    })
}

/// Delete a document from the caller's own application.
pub async fn remove_document(
    db: &DbPool,
    storage: &Storage,
    caller: &AuthUser,
    document_id: Uuid,
) -> AppResult<()> {
    let document = db
        .get_document(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {}", document_id)))?;
    let application = load_application(db, document.application_id).await?;

    if caller.role != Role::Applicant || application.user_id != caller.user_id {
        return Err(AppError::Forbidden(
            "Only the applicant can delete this document".to_string(),
        ));
    }

    if !db.delete_document(document.id).await? {
        return Err(AppError::NotFound(format!("Document {}", document_id)));
    }

    if let Err(e) = storage.delete(&document.storage_key).await {
        warn!(
            "Document {} deleted but its object {} remains: {}",
            document.id, document.storage_key, e
        );
    }

    info!(
        "Document {} deleted from application {}",
        document.id, application.id
    );
    Ok(())
}

/// List documents of an application visible to the caller.
pub async fn list_documents(
    db: &DbPool,
    caller: &AuthUser,
    application_id: Uuid,
) -> AppResult<Vec<ApplicationDocument>> {
    let application = load_application(db, application_id).await?;
    authorize_application(db, caller, &application).await?;
    db.list_documents(application.id).await
}
