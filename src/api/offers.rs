//! Offer catalog handlers.

use actix_web::{HttpResponse, web};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::{
    CreateOfferRequest, Offer, OfferListQuery, OfferListResponse, OfferResponse, Pagination,
    RecruiterOffersResponse, Role, UpdateOfferRequest,
};
use crate::services::Storage;
use crate::services::workflow::{can_manage_offer, load_offer};

async fn with_company_names(
    pool: &DbPool,
    offers: Vec<Offer>,
    include_counts: bool,
) -> AppResult<Vec<OfferResponse>> {
    let mut company_ids: Vec<Uuid> = offers.iter().map(|o| o.company_id).collect();
    company_ids.sort();
    company_ids.dedup();
    let names = pool.get_company_names(&company_ids).await?;

    let counts = if include_counts {
        let ids: Vec<Uuid> = offers.iter().map(|o| o.id).collect();
        Some(pool.count_applications_by_offers(&ids).await?)
    } else {
        None
    };

    Ok(offers
        .into_iter()
        .map(|offer| OfferResponse {
            company_name: names.get(&offer.company_id).cloned(),
            application_count: counts
                .as_ref()
                .map(|c| c.get(&offer.id).copied().unwrap_or(0)),
            offer,
        })
        .collect())
}

async fn single_response(
    pool: &DbPool,
    offer: Offer,
    include_count: bool,
) -> AppResult<OfferResponse> {
    with_company_names(pool, vec![offer], include_count)
        .await?
        .pop()
        .ok_or_else(|| AppError::Database("Offer vanished while building response".to_string()))
}

/// Search active offers.
#[utoipa::path(
    get,
    path = "/api/v1/offers",
    tag = "Offers",
    params(OfferListQuery),
    responses(
        (status = 200, description = "Matching active offers, newest first", body = OfferListResponse),
        (status = 400, description = "Unknown filter value", body = ErrorResponse),
    )
)]
pub async fn list_offers(
    pool: web::Data<DbPool>,
    query: web::Query<OfferListQuery>,
) -> AppResult<HttpResponse> {
    let filter = query.to_filter().map_err(AppError::InvalidInput)?;
    let page = query.page();
    let limit = query.limit();
    let offset = Pagination::new(page, limit, 0).offset();

    let (offers, total) = pool
        .list_active_offers(&filter, offset, limit as usize)
        .await?;
    let offers = with_company_names(&pool, offers, false).await?;

    Ok(HttpResponse::Ok().json(OfferListResponse {
        offers,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// The calling recruiter's offers, any status, with application counts.
#[utoipa::path(
    get,
    path = "/api/v1/offers/mine",
    tag = "Offers",
    responses(
        (status = 200, description = "Recruiter's offers", body = RecruiterOffersResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not a recruiter", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn my_offers(auth: AuthUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Recruiter])?;
    let offers = pool.list_offers_by_recruiter(auth.user_id).await?;
    let offers = with_company_names(&pool, offers, true).await?;
    Ok(HttpResponse::Ok().json(RecruiterOffersResponse { offers }))
}

/// Get one offer. Paused offers are only visible to their owner and admins.
#[utoipa::path(
    get,
    path = "/api/v1/offers/{offer_id}",
    tag = "Offers",
    params(("offer_id" = Uuid, Path, description = "Offer UUID")),
    responses(
        (status = 200, description = "Offer", body = OfferResponse),
        (status = 404, description = "Offer not found", body = ErrorResponse),
    )
)]
pub async fn get_offer(
    auth: Option<AuthUser>,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let offer = load_offer(&pool, path.into_inner()).await?;
    let manager = auth.as_ref().is_some_and(|a| can_manage_offer(a, &offer));

    if !offer.is_active() && !manager {
        return Err(AppError::NotFound(format!("Offer {}", offer.id)));
    }

    Ok(HttpResponse::Ok().json(single_response(&pool, offer, manager).await?))
}

/// Publish an offer for the recruiter's company.
#[utoipa::path(
    post,
    path = "/api/v1/offers",
    tag = "Offers",
    request_body = CreateOfferRequest,
    responses(
        (status = 201, description = "Offer created", body = OfferResponse),
        (status = 400, description = "Invalid offer or recruiter without company", body = ErrorResponse),
        (status = 403, description = "Not a recruiter", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_offer(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateOfferRequest>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Recruiter])?;

    let mut req = body.into_inner();
    req.validate().map_err(AppError::InvalidInput)?;

    let recruiter = pool
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;
    let company_id = recruiter.company_id.ok_or_else(|| {
        AppError::InvalidInput(
            "Recruiter must belong to a company before publishing offers".to_string(),
        )
    })?;

    let offer = pool.insert_offer(&req, company_id, recruiter.id).await?;
    info!(
        "Offer {} '{}' created by recruiter {}",
        offer.id, offer.title, recruiter.id
    );

    Ok(HttpResponse::Created().json(single_response(&pool, offer, true).await?))
}

/// Update an offer. Absent fields are left unchanged.
#[utoipa::path(
    put,
    path = "/api/v1/offers/{offer_id}",
    tag = "Offers",
    params(("offer_id" = Uuid, Path, description = "Offer UUID")),
    request_body = UpdateOfferRequest,
    responses(
        (status = 200, description = "Offer updated", body = OfferResponse),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 403, description = "Not the offer owner", body = ErrorResponse),
        (status = 404, description = "Offer not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_offer(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateOfferRequest>,
) -> AppResult<HttpResponse> {
    let mut offer = load_offer(&pool, path.into_inner()).await?;
    if auth.role != Role::Recruiter || offer.recruiter_id != auth.user_id {
        return Err(AppError::Forbidden(
            "Only the recruiter who owns the offer can edit it".to_string(),
        ));
    }

    body.into_inner()
        .apply_to(&mut offer)
        .map_err(AppError::InvalidInput)?;
    let offer = pool.update_offer(&offer).await?;
    info!("Offer {} updated (status {})", offer.id, offer.status.as_str());

    Ok(HttpResponse::Ok().json(single_response(&pool, offer, true).await?))
}

/// Delete an offer with its applications and documents.
#[utoipa::path(
    delete,
    path = "/api/v1/offers/{offer_id}",
    tag = "Offers",
    params(("offer_id" = Uuid, Path, description = "Offer UUID")),
    responses(
        (status = 204, description = "Offer deleted"),
        (status = 403, description = "Not the offer owner", body = ErrorResponse),
        (status = 404, description = "Offer not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_offer(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let offer = load_offer(&pool, path.into_inner()).await?;
    if !can_manage_offer(&auth, &offer) {
        return Err(AppError::Forbidden(
            "Only the recruiter who owns the offer can delete it".to_string(),
        ));
    }

    let deletion = pool.delete_offer_cascade(offer.id).await?;

    for key in &deletion.storage_keys {
        if let Err(e) = storage.delete(key).await {
            warn!("Failed to delete object {} of offer {}: {}", key, offer.id, e);
        }
    }

    info!(
        "Offer {} deleted with {} applications and {} documents",
        offer.id, deletion.applications, deletion.documents
    );
    Ok(HttpResponse::NoContent().finish())
}

/// Configure offer routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/offers")
            .route(web::get().to(list_offers))
            .route(web::post().to(create_offer)),
    )
    // Registered before /offers/{offer_id} so "mine" is not parsed as an id
    .service(web::resource("/offers/mine").route(web::get().to(my_offers)))
    .service(
        web::resource("/offers/{offer_id}")
            .route(web::get().to(get_offer))
            .route(web::put().to(update_offer))
            .route(web::delete().to(delete_offer)),
    );
}
