//! Company directory handlers.

use actix_web::{HttpResponse, web};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::{CompanyListResponse, CompanyResponse, CreateCompanyRequest, Role};

/// List companies with their number of active offers, sorted by name.
#[utoipa::path(
    get,
    path = "/api/v1/companies",
    tag = "Companies",
    responses(
        (status = 200, description = "Company directory", body = CompanyListResponse),
    )
)]
pub async fn list_companies(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let companies = pool.list_companies_with_offer_counts().await?;
    Ok(HttpResponse::Ok().json(CompanyListResponse { companies }))
}

/// Get one company.
#[utoipa::path(
    get,
    path = "/api/v1/companies/{company_id}",
    tag = "Companies",
    params(("company_id" = Uuid, Path, description = "Company UUID")),
    responses(
        (status = 200, description = "Company", body = CompanyResponse),
        (status = 404, description = "Company not found", body = ErrorResponse),
    )
)]
pub async fn get_company(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let company_id = path.into_inner();
    let company = pool
        .get_company_with_offer_count(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {}", company_id)))?;

    Ok(HttpResponse::Ok().json(company))
}

/// Create a company. A recruiter without an employer is attached to it.
#[utoipa::path(
    post,
    path = "/api/v1/companies",
    tag = "Companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 400, description = "Invalid company", body = ErrorResponse),
        (status = 403, description = "Applicants cannot create companies", body = ErrorResponse),
        (status = 409, description = "Company name already taken", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_company(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateCompanyRequest>,
) -> AppResult<HttpResponse> {
    auth.require_role(&[Role::Recruiter, Role::Admin])?;

    let mut req = body.into_inner();
    req.validate().map_err(AppError::InvalidInput)?;

    let company = pool
        .insert_company(&req.name, req.sector.as_deref())
        .await?;
    info!("Company {} ({}) created by {}", company.id, company.name, auth.user_id);

    if auth.role == Role::Recruiter {
        let user = pool
            .get_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;
        if user.company_id.is_none() {
            pool.set_user_company(user.id, company.id).await?;
            info!("Recruiter {} attached to company {}", user.id, company.id);
        }
    }

    Ok(HttpResponse::Created().json(CompanyResponse {
        id: company.id,
        name: company.name,
        sector: company.sector,
        offer_count: 0,
        created_at: company.created_at,
    }))
}

/// Configure company routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/companies")
            .route(web::get().to(list_companies))
            .route(web::post().to(create_company)),
    )
    .service(web::resource("/companies/{company_id}").route(web::get().to(get_company)));
}
