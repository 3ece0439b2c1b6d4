//! Application models and the NOT_VIEWED → VIEWED status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::document::{DocumentResponse, DocumentType};
use super::user::ApplicantSummary;

/// Review status of an application.
///
/// The only transition is NOT_VIEWED → VIEWED; a viewed application never
/// goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    #[default]
    NotViewed,
    Viewed,
}

/// Outcome of a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The status moved forward.
    Transitioned,
    /// Already in the requested state.
    Unchanged,
}

/// A status change that would move the machine backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("application status cannot change from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotViewed => "NOT_VIEWED",
            Self::Viewed => "VIEWED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NOT_VIEWED" => Some(Self::NotViewed),
            "VIEWED" => Some(Self::Viewed),
            _ => None,
        }
    }

    /// Check whether moving to `target` is allowed.
    pub fn transition_to(self, target: ApplicationStatus) -> Result<StatusChange, InvalidTransition> {
        match (self, target) {
            (Self::NotViewed, Self::Viewed) => Ok(StatusChange::Transitioned),
            (from, to) if from == to => Ok(StatusChange::Unchanged),
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application stored in database.
#[derive(Debug, Clone)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub offer_id: Uuid,
    pub company_id: Uuid,
    pub status: ApplicationStatus,
    pub viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether an application carries its mandatory documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReadiness {
    pub cv_uploaded: bool,
    pub cover_letter_uploaded: bool,
    /// True once a CV is attached; the cover letter is optional.
    pub ready: bool,
}

impl SubmissionReadiness {
    pub fn from_document_types<'a>(types: impl IntoIterator<Item = &'a DocumentType>) -> Self {
        let mut cv_uploaded = false;
        let mut cover_letter_uploaded = false;
        for t in types {
            match t {
                DocumentType::Cv => cv_uploaded = true,
                DocumentType::CoverLetter => cover_letter_uploaded = true,
            }
        }
        Self {
            cv_uploaded,
            cover_letter_uploaded,
            ready: cv_uploaded,
        }
    }
}

/// Application as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub offer_id: Uuid,
    pub company_id: Uuid,
    pub status: ApplicationStatus,
    pub viewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub offer_title: Option<String>,
    pub company_name: Option<String>,
    pub cv_uploaded: bool,
    pub cover_letter_uploaded: bool,
    pub documents: Vec<DocumentResponse>,
    /// Filled for recruiter-facing views only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<ApplicantSummary>,
}

/// Request body for POST /applications.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub offer_id: Uuid,
}

/// Request body for PUT /applications/{id}/status.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
}

/// List response for application listings.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationResponse>,
}

/// Result of marking every application of an offer as viewed.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkViewResponse {
    pub offer_id: Uuid,
    pub updated: u64,
    pub already_viewed: u64,
    /// Items whose update failed; they were logged and skipped.
    pub failed: u64,
}
