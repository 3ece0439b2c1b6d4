//! Actix-web extractor for bearer session tokens.
//!
//! Routes that require a login take `AuthUser`; public routes that only
//! behave differently for a logged-in caller take `Option<AuthUser>`.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use std::future::{Ready, ready};
use uuid::Uuid;

use super::TokenService;
use crate::error::{AppError, AppResult};
use crate::models::Role;

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with 403 unless the caller holds one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Role {} is not allowed to perform this action",
                self.role
            )))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(tokens) = req.app_data::<web::Data<TokenService>>() else {
            return ready(Err(AppError::Unauthorized(
                "Internal configuration error".to_string(),
            )));
        };

        let Some(token) = bearer_token(req) else {
            return ready(Err(AppError::Unauthorized(
                "Missing bearer token. Provide an Authorization header.".to_string(),
            )));
        };

        match tokens.verify(token) {
            Ok(identity) => ready(Ok(AuthUser {
                user_id: identity.user_id,
                role: identity.role,
            })),
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                ready(Err(AppError::Unauthorized(
                    "Invalid or expired session token".to_string(),
                )))
            }
        }
    }
}
