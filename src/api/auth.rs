//! Registration, login and current-user endpoints.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::{AuthUser, DUMMY_PASSWORD_HASH, TokenService, hash_password, verify_password};
use crate::db::DbPool;
use crate::db::users::NewUser;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, Role, UserResponse};

/// Message for every failed login, whichever part was wrong.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Create an applicant or recruiter account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid registration data", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    )
)]
pub async fn register(
    pool: web::Data<DbPool>,
    tokens: web::Data<TokenService>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let mut req = body.into_inner();
    req.validate().map_err(AppError::InvalidInput)?;

    if let Some(company_id) = req.company_id
        && pool.get_company(company_id).await?.is_none()
    {
        return Err(AppError::NotFound(format!("Company {}", company_id)));
    }

    if pool.get_user_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = pool
        .insert_user(NewUser {
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            role: req.role,
            company_id: if req.role == Role::Recruiter {
                req.company_id
            } else {
                None
            },
        })
        .await?;

    let token = tokens.issue(user.id, user.role)?;
    info!("Registered {} account {}", user.role, user.id);

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Exchange email and password for a session token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    )
)]
pub async fn login(
    pool: web::Data<DbPool>,
    tokens: web::Data<TokenService>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = req.email.trim().to_lowercase();

    let Some(user) = pool.get_user_by_email(&email).await? else {
        verify_password(&req.password, DUMMY_PASSWORD_HASH);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(&req.password, &user.password_hash) {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = tokens.issue(user.id, user.role)?;
    info!("User {} logged in", user.id);

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// Return the authenticated user.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn me(auth: AuthUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    // A token can outlive its account
    let user = pool
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Configure auth routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/auth/register").route(web::post().to(register)))
        .service(web::resource("/auth/login").route(web::post().to(login)))
        .service(web::resource("/auth/me").route(web::get().to(me)));
}
