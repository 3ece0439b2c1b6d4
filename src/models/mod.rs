//! Domain models for the Handi job board.

use utoipa::ToSchema;

pub mod application;
pub mod company;
pub mod document;
pub mod offer;
pub mod user;

// Re-export commonly used types
pub use application::{
    Application, ApplicationListResponse, ApplicationResponse, ApplicationStatus,
    BulkViewResponse, CreateApplicationRequest, InvalidTransition, StatusChange,
    SubmissionReadiness, UpdateStatusRequest,
};
pub use company::{CompanyListResponse, CompanyResponse, CreateCompanyRequest};
pub use document::{
    ApplicationDocument, DocumentListResponse, DocumentRejection, DocumentResponse,
    DocumentType, DocumentUploadForm, ValidatedUpload, mime_for_extension,
    validate_document_upload,
};
pub use offer::{
    ContractType, CreateOfferRequest, DisabilityCategory, ExperienceLevel, Offer, OfferFilter,
    OfferListQuery, OfferListResponse, OfferResponse, OfferStatus, RecruiterOffersResponse,
    RemotePolicy, UpdateOfferRequest,
};
pub use user::{
    ApplicantSummary, AuthResponse, LoginRequest, RegisterRequest, Role, SessionClaims, User,
    UserResponse,
};

/// Pagination metadata for responses.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if total == 0 || limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64) as u32
        };

        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }

    /// Offset of the first item of the page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }
}
