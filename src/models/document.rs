//! Application document models (CV, cover letter) and upload validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of document attached to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Cv,
    CoverLetter,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cv => "CV",
            Self::CoverLetter => "COVER_LETTER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CV" => Some(Self::Cv),
            "COVER_LETTER" | "COVERLETTER" => Some(Self::CoverLetter),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document stored in database.
#[derive(Debug, Clone)]
pub struct ApplicationDocument {
    pub id: Uuid,
    pub application_id: Uuid,
    pub document_type: DocumentType,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub storage_key: String,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// Document metadata as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: Uuid,
    pub application_id: Uuid,
    pub document_type: DocumentType,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

impl From<ApplicationDocument> for DocumentResponse {
    fn from(d: ApplicationDocument) -> Self {
        Self {
            id: d.id,
            application_id: d.application_id,
            document_type: d.document_type,
            file_name: d.file_name,
            file_size: d.file_size,
            content_type: d.content_type,
            sha256: d.sha256,
            created_at: d.created_at,
        }
    }
}

/// Multipart form accepted by POST /documents/upload (OpenAPI only).
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
#[schema(rename_all = "camelCase")]
pub struct DocumentUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub application_id: Uuid,
    pub document_type: DocumentType,
}

/// Document list for an application.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
}

/// Allowed file extensions for CVs and cover letters.
pub const ALLOWED_DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Allowed MIME types, index-aligned with the extensions above.
pub const ALLOWED_DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Maximum length of a stored file name.
const MAX_FILE_NAME_LENGTH: usize = 255;

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentRejection {
    #[error("File name is missing or invalid")]
    InvalidFileName,
    #[error("File extension '{0}' not allowed. Allowed: pdf, doc, docx")]
    ExtensionNotAllowed(String),
    #[error("Content type '{0}' not allowed. Allowed: PDF or Word documents")]
    MimeTypeNotAllowed(String),
    #[error("File is empty")]
    Empty,
    #[error("File size {size} exceeds maximum {max} bytes")]
    TooLarge { size: u64, max: u64 },
}

/// A document upload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    /// File name with any directory components stripped
    pub file_name: String,
    pub extension: String,
    pub content_type: String,
}

/// Return the base name of a client-supplied path.
fn sanitize_file_name(raw: &str) -> Option<&str> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if base.is_empty() || base == "." || base == ".." || base.chars().any(char::is_control) {
        return None;
    }
    Some(base)
}

/// Shorten the stem so that `stem.ext` fits the stored name length.
fn truncate_file_name(stem: &str, ext: &str) -> String {
    let budget = MAX_FILE_NAME_LENGTH.saturating_sub(ext.chars().count() + 1);
    let stem: String = stem.chars().take(budget).collect();
    format!("{}.{}", stem, ext)
}

/// Infer the MIME type of an allowed extension.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    ALLOWED_DOCUMENT_EXTENSIONS
        .iter()
        .position(|e| *e == ext)
        .map(|i| ALLOWED_DOCUMENT_MIME_TYPES[i])
}

/// Validate name, type and size of a CV / cover letter upload.
///
/// A missing or `application/octet-stream` content type is inferred from the
/// extension; any other declared type must match the extension's MIME type.
/// Over-long names keep their extension and lose the end of the stem.
pub fn validate_document_upload(
    file_name: &str,
    content_type: Option<&str>,
    size: u64,
    max_size: u64,
) -> Result<ValidatedUpload, DocumentRejection> {
    let base = sanitize_file_name(file_name).ok_or(DocumentRejection::InvalidFileName)?;

    let (stem, raw_extension) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => return Err(DocumentRejection::ExtensionNotAllowed(String::new())),
    };
    let extension = raw_extension.to_lowercase();
    let inferred = mime_for_extension(&extension)
        .ok_or_else(|| DocumentRejection::ExtensionNotAllowed(extension.clone()))?;
    let file_name = truncate_file_name(stem, raw_extension);

    let declared = content_type
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_lowercase()
        })
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    // A declared type must be the one the extension maps to
    if let Some(ct) = declared
        && ct != inferred
    {
        return Err(DocumentRejection::MimeTypeNotAllowed(ct));
    }
    let content_type = inferred.to_string();

    if size == 0 {
        return Err(DocumentRejection::Empty);
    }
    if size > max_size {
        return Err(DocumentRejection::TooLarge {
            size,
            max: max_size,
        });
    }

    Ok(ValidatedUpload {
        file_name,
        extension,
        content_type,
    })
}
