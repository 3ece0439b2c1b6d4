//! API endpoint modules.

pub mod applications;
pub mod auth;
pub mod companies;
pub mod documents;
pub mod health;
pub mod offers;
pub mod openapi;

use actix_web::{HttpRequest, error, web};

use crate::error::AppError;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;

/// Register every `/api/v1` route (health included).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(auth::configure_routes)
        .configure(companies::configure_routes)
        .configure(offers::configure_routes)
        .configure(applications::configure_routes)
        .configure(documents::configure_routes);
}

/// Render JSON body errors in the API error format.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
        AppError::InvalidInput(err.to_string()).into()
    })
}

/// Render query string errors in the API error format.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _req: &HttpRequest| {
        AppError::InvalidInput(err.to_string()).into()
    })
}

/// Malformed path ids are reported as missing resources.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _req: &HttpRequest| {
        AppError::NotFound(format!("Resource ({})", err)).into()
    })
}
