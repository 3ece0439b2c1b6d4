//! Application workflow: creation, readiness gate, status machine and
//! role-scoped reads.

use std::collections::HashSet;

use futures_util::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    ApplicantSummary, Application, ApplicationResponse, ApplicationStatus, BulkViewResponse,
    DocumentResponse, Offer, Role, StatusChange, SubmissionReadiness,
};

/// How a caller is related to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationAccess {
    /// The applicant who submitted it
    Applicant,
    /// The recruiter who owns the offer
    Recruiter,
    Admin,
}

impl ApplicationAccess {
    pub fn is_recruiter_view(&self) -> bool {
        matches!(self, Self::Recruiter | Self::Admin)
    }
}

/// Load an application or fail with 404.
pub async fn load_application(db: &DbPool, id: Uuid) -> AppResult<Application> {
    db.get_application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {}", id)))
}

/// Load an offer or fail with 404.
pub async fn load_offer(db: &DbPool, id: Uuid) -> AppResult<Offer> {
    db.get_offer(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Offer {}", id)))
}

/// Whether the caller may manage an offer (its recruiter or an admin).
pub fn can_manage_offer(caller: &AuthUser, offer: &Offer) -> bool {
    caller.is_admin() || (caller.role == Role::Recruiter && offer.recruiter_id == caller.user_id)
}

/// Resolve the caller's access to an application, or 403.
pub async fn authorize_application(
    db: &DbPool,
    caller: &AuthUser,
    application: &Application,
) -> AppResult<ApplicationAccess> {
    if caller.role == Role::Applicant && application.user_id == caller.user_id {
        return Ok(ApplicationAccess::Applicant);
    }
    if caller.is_admin() {
        return Ok(ApplicationAccess::Admin);
    }
    if caller.role == Role::Recruiter {
        let offer = load_offer(db, application.offer_id).await?;
        if offer.recruiter_id == caller.user_id {
            return Ok(ApplicationAccess::Recruiter);
        }
    }
    Err(AppError::Forbidden(
        "You do not have access to this application".to_string(),
    ))
}

/// Apply to an offer. Only ACTIVE offers accept applications.
pub async fn create_application(
    db: &DbPool,
    caller: &AuthUser,
    offer_id: Uuid,
) -> AppResult<Application> {
    caller.require_role(&[Role::Applicant])?;

    let offer = load_offer(db, offer_id).await?;
    if !offer.is_active() {
        // Paused offers are hidden from applicants
        return Err(AppError::NotFound(format!("Offer {}", offer_id)));
    }

    let application = db
        .insert_application(caller.user_id, offer.id, offer.company_id)
        .await?;

    info!(
        "Application {} created by user {} for offer {}",
        application.id, caller.user_id, offer.id
    );
    Ok(application)
}

/// Compute which mandatory documents an application carries.
pub async fn readiness(db: &DbPool, application_id: Uuid) -> AppResult<SubmissionReadiness> {
    let documents = db.list_documents(application_id).await?;
    Ok(SubmissionReadiness::from_document_types(
        documents.iter().map(|d| &d.document_type),
    ))
}

/// Check that an application can be submitted. Read-only.
pub async fn finalize_application(
    db: &DbPool,
    caller: &AuthUser,
    application_id: Uuid,
) -> AppResult<SubmissionReadiness> {
    let application = load_application(db, application_id).await?;
    if caller.role != Role::Applicant || application.user_id != caller.user_id {
        return Err(AppError::Forbidden(
            "Only the applicant can finalize this application".to_string(),
        ));
    }

    let readiness = readiness(db, application.id).await?;
    if !readiness.ready {
        return Err(AppError::InvalidInput(
            "A CV must be uploaded before the application can be submitted".to_string(),
        ));
    }
    Ok(readiness)
}

/// Move an application to `target` on behalf of the offer's recruiter.
pub async fn update_status(
    db: &DbPool,
    caller: &AuthUser,
    application_id: Uuid,
    target: ApplicationStatus,
) -> AppResult<Application> {
    let application = load_application(db, application_id).await?;
    let offer = load_offer(db, application.offer_id).await?;
    if !can_manage_offer(caller, &offer) {
        return Err(AppError::Forbidden(
            "Only the recruiter who owns the offer can change this status".to_string(),
        ));
    }

    let change = application
        .status
        .transition_to(target)
        .map_err(|e| AppError::Conflict(e.to_string()))?;

    match change {
        StatusChange::Unchanged => Ok(application),
        StatusChange::Transitioned => {
            if db.mark_application_viewed(application.id).await? {
                info!(
                    "Application {} marked {} by {}",
                    application.id, target, caller.user_id
                );
            }
            load_application(db, application.id).await
        }
    }
}

/// Count per-item outcomes of a bulk VIEWED update.
///
/// `Ok(false)` means another request got there first. Failures are logged
/// and counted.
fn tally_view_results(
    response: &mut BulkViewResponse,
    ids: &[Uuid],
    results: Vec<AppResult<bool>>,
) {
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(true) => response.updated += 1,
            Ok(false) => response.already_viewed += 1,
            Err(e) => {
                warn!("Failed to mark application {} viewed: {}", id, e);
                response.failed += 1;
            }
        }
    }
}

/// Mark every application of an offer as VIEWED.
///
/// Each item is a separate conditional update; one failing item is logged
/// and counted without stopping the others.
pub async fn mark_offer_viewed(
    db: &DbPool,
    caller: &AuthUser,
    offer_id: Uuid,
) -> AppResult<BulkViewResponse> {
    let offer = load_offer(db, offer_id).await?;
    if !can_manage_offer(caller, &offer) {
        return Err(AppError::Forbidden(
            "Only the recruiter who owns the offer can review its applications".to_string(),
        ));
    }

    let applications = db.list_applications_by_offers(&[offer.id]).await?;
    let mut response = BulkViewResponse {
        offer_id: offer.id,
        ..Default::default()
    };

    let pending: Vec<Uuid> = applications
        .iter()
        .filter(|a| a.status == ApplicationStatus::NotViewed)
        .map(|a| a.id)
        .collect();
    response.already_viewed = (applications.len() - pending.len()) as u64;

    let results = join_all(pending.iter().map(|id| db.mark_application_viewed(*id))).await;
    tally_view_results(&mut response, &pending, results);

    info!(
        "Offer {} bulk view: {} updated, {} already viewed, {} failed",
        offer.id, response.updated, response.already_viewed, response.failed
    );
    Ok(response)
}

/// Embed offer title, company name, documents and (optionally) the
/// applicant summary into each application.
pub async fn build_responses(
    db: &DbPool,
    applications: Vec<Application>,
    include_applicant: bool,
) -> AppResult<Vec<ApplicationResponse>> {
    let application_ids: Vec<Uuid> = applications.iter().map(|a| a.id).collect();
    let offer_ids = unique(applications.iter().map(|a| a.offer_id));
    let company_ids = unique(applications.iter().map(|a| a.company_id));

    let offers = db.get_offers_by_ids(&offer_ids).await?;
    let companies = db.get_company_names(&company_ids).await?;
    let mut documents = db.list_documents_for_applications(&application_ids).await?;
    let applicants = if include_applicant {
        let user_ids = unique(applications.iter().map(|a| a.user_id));
        db.get_users_by_ids(&user_ids).await?
    } else {
        Default::default()
    };

    Ok(applications
        .into_iter()
        .map(|a| {
            let docs = documents.remove(&a.id).unwrap_or_default();
            let readiness =
                SubmissionReadiness::from_document_types(docs.iter().map(|d| &d.document_type));
            ApplicationResponse {
                offer_title: offers.get(&a.offer_id).map(|o| o.title.clone()),
                company_name: companies.get(&a.company_id).cloned(),
                cv_uploaded: readiness.cv_uploaded,
                cover_letter_uploaded: readiness.cover_letter_uploaded,
                documents: docs.into_iter().map(DocumentResponse::from).collect(),
                applicant: applicants.get(&a.user_id).map(ApplicantSummary::from),
                id: a.id,
                user_id: a.user_id,
                offer_id: a.offer_id,
                company_id: a.company_id,
                status: a.status,
                viewed_at: a.viewed_at,
                created_at: a.created_at,
            }
        })
        .collect())
}

/// The caller's own applications.
pub async fn list_for_applicant(
    db: &DbPool,
    caller: &AuthUser,
) -> AppResult<Vec<ApplicationResponse>> {
    caller.require_role(&[Role::Applicant])?;
    let applications = db.list_applications_by_user(caller.user_id).await?;
    build_responses(db, applications, false).await
}

/// Applications to one offer, for its recruiter or an admin.
pub async fn list_for_offer(
    db: &DbPool,
    caller: &AuthUser,
    offer_id: Uuid,
) -> AppResult<Vec<ApplicationResponse>> {
    caller.require_role(&[Role::Recruiter, Role::Admin])?;
    let offer = load_offer(db, offer_id).await?;
    if !can_manage_offer(caller, &offer) {
        return Err(AppError::Forbidden(
            "Only the recruiter who owns the offer can list its applications".to_string(),
        ));
    }
    let applications = db.list_applications_by_offers(&[offer.id]).await?;
    build_responses(db, applications, true).await
}

/// Applications to every offer of the calling recruiter.
pub async fn list_for_recruiter(
    db: &DbPool,
    caller: &AuthUser,
) -> AppResult<Vec<ApplicationResponse>> {
    caller.require_role(&[Role::Recruiter])?;
    let offer_ids: Vec<Uuid> = db
        .list_offers_by_recruiter(caller.user_id)
        .await?
        .into_iter()
        .map(|o| o.id)
        .collect();
    let applications = db.list_applications_by_offers(&offer_ids).await?;
    build_responses(db, applications, true).await
}

/// One application, with visibility checks.
pub async fn get_for_caller(
    db: &DbPool,
    caller: &AuthUser,
    application_id: Uuid,
) -> AppResult<ApplicationResponse> {
    let application = load_application(db, application_id).await?;
    let access = authorize_application(db, caller, &application).await?;
    build_responses(db, vec![application], access.is_recruiter_view())
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Application {}", application_id)))
}

fn unique(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}
