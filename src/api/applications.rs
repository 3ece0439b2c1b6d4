//! Application workflow handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::{AppResult, ErrorResponse};
use crate::models::{
    ApplicationListResponse, ApplicationResponse, BulkViewResponse, CreateApplicationRequest,
    DocumentListResponse, DocumentResponse, SubmissionReadiness, UpdateStatusRequest,
};
use crate::services::{documents, workflow};

/// Apply to an active offer.
#[utoipa::path(
    post,
    path = "/api/v1/applications",
    tag = "Applications",
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Application created", body = ApplicationResponse),
        (status = 403, description = "Only applicants can apply", body = ErrorResponse),
        (status = 404, description = "Offer not found or not active", body = ErrorResponse),
        (status = 409, description = "Already applied to this offer", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_application(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateApplicationRequest>,
) -> AppResult<HttpResponse> {
    let application = workflow::create_application(&pool, &auth, body.offer_id).await?;
    let response = workflow::get_for_caller(&pool, &auth, application.id).await?;
    Ok(HttpResponse::Created().json(response))
}

/// The caller's own applications.
#[utoipa::path(
    get,
    path = "/api/v1/applications/me",
    tag = "Applications",
    responses(
        (status = 200, description = "Applicant's applications", body = ApplicationListResponse),
        (status = 403, description = "Not an applicant", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn my_applications(auth: AuthUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let applications = workflow::list_for_applicant(&pool, &auth).await?;
    Ok(HttpResponse::Ok().json(ApplicationListResponse { applications }))
}

/// Applications to every offer of the calling recruiter.
#[utoipa::path(
    get,
    path = "/api/v1/applications/recruiter",
    tag = "Applications",
    responses(
        (status = 200, description = "Applications to the recruiter's offers", body = ApplicationListResponse),
        (status = 403, description = "Not a recruiter", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn recruiter_applications(
    auth: AuthUser,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let applications = workflow::list_for_recruiter(&pool, &auth).await?;
    Ok(HttpResponse::Ok().json(ApplicationListResponse { applications }))
}

/// Applications to one offer.
#[utoipa::path(
    get,
    path = "/api/v1/applications/offer/{offer_id}",
    tag = "Applications",
    params(("offer_id" = Uuid, Path, description = "Offer UUID")),
    responses(
        (status = 200, description = "Applications to the offer", body = ApplicationListResponse),
        (status = 403, description = "Not the offer owner", body = ErrorResponse),
        (status = 404, description = "Offer not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn offer_applications(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let applications = workflow::list_for_offer(&pool, &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApplicationListResponse { applications }))
}

/// Mark every application of an offer as VIEWED.
#[utoipa::path(
    post,
    path = "/api/v1/applications/offer/{offer_id}/viewed",
    tag = "Applications",
    params(("offer_id" = Uuid, Path, description = "Offer UUID")),
    responses(
        (status = 200, description = "Per-item outcome counts", body = BulkViewResponse),
        (status = 403, description = "Not the offer owner", body = ErrorResponse),
        (status = 404, description = "Offer not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn mark_offer_viewed(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let response = workflow::mark_offer_viewed(&pool, &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Get one application.
#[utoipa::path(
    get,
    path = "/api/v1/applications/{application_id}",
    tag = "Applications",
    params(("application_id" = Uuid, Path, description = "Application UUID")),
    responses(
        (status = 200, description = "Application", body = ApplicationResponse),
        (status = 403, description = "No access to this application", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_application(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let response = workflow::get_for_caller(&pool, &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Check that the application carries a CV. Changes nothing.
#[utoipa::path(
    post,
    path = "/api/v1/applications/{application_id}/finalize",
    tag = "Applications",
    params(("application_id" = Uuid, Path, description = "Application UUID")),
    responses(
        (status = 200, description = "Application is ready", body = SubmissionReadiness),
        (status = 400, description = "No CV attached", body = ErrorResponse),
        (status = 403, description = "Not the applicant", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn finalize_application(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let readiness = workflow::finalize_application(&pool, &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(readiness))
}

/// Change the status of an application (NOT_VIEWED → VIEWED only).
#[utoipa::path(
    put,
    path = "/api/v1/applications/{application_id}/status",
    tag = "Applications",
    params(("application_id" = Uuid, Path, description = "Application UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Application after the change", body = ApplicationResponse),
        (status = 403, description = "Not the offer owner", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse),
        (status = 409, description = "Status cannot go back", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> AppResult<HttpResponse> {
    let application =
        workflow::update_status(&pool, &auth, path.into_inner(), body.status).await?;
    let response = workflow::get_for_caller(&pool, &auth, application.id).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Documents attached to an application.
#[utoipa::path(
    get,
    path = "/api/v1/applications/{application_id}/documents",
    tag = "Applications",
    params(("application_id" = Uuid, Path, description = "Application UUID")),
    responses(
        (status = 200, description = "Documents", body = DocumentListResponse),
        (status = 403, description = "No access to this application", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn application_documents(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let documents = documents::list_documents(&pool, &auth, path.into_inner())
        .await?
        .into_iter()
        .map(DocumentResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(DocumentListResponse { documents }))
}

/// Configure application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/applications").route(web::post().to(create_application)))
        .service(web::resource("/applications/me").route(web::get().to(my_applications)))
        .service(
            web::resource("/applications/recruiter").route(web::get().to(recruiter_applications)),
        )
        .service(
            web::resource("/applications/offer/{offer_id}")
                .route(web::get().to(offer_applications)),
        )
        .service(
            web::resource("/applications/offer/{offer_id}/viewed")
                .route(web::post().to(mark_offer_viewed)),
        )
        .service(
            web::resource("/applications/{application_id}").route(web::get().to(get_application)),
        )
        .service(
            web::resource("/applications/{application_id}/finalize")
                .route(web::post().to(finalize_application)),
        )
        .service(
            web::resource("/applications/{application_id}/status")
                .route(web::put().to(update_status)),
        )
        .service(
            web::resource("/applications/{application_id}/documents")
                .route(web::get().to(application_documents)),
        );
}
