//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Handi Server",
        version = "0.1.0",
        description = "Job board API connecting applicants and recruiters: offers, applications and CV / cover letter documents"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Auth endpoints
        api::auth::register,
        api::auth::login,
        api::auth::me,
        // Company endpoints
        api::companies::list_companies,
        api::companies::get_company,
        api::companies::create_company,
        // Offer endpoints
        api::offers::list_offers,
        api::offers::my_offers,
        api::offers::get_offer,
        api::offers::create_offer,
        api::offers::update_offer,
        api::offers::delete_offer,
        // Application endpoints
        api::applications::create_application,
        api::applications::my_applications,
        api::applications::recruiter_applications,
        api::applications::offer_applications,
        api::applications::mark_offer_viewed,
        api::applications::get_application,
        api::applications::finalize_application,
        api::applications::update_status,
        api::applications::application_documents,
        // Document endpoints
        api::documents::upload_document,
        api::documents::get_document,
        api::documents::delete_document,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::Pagination,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Auth
            models::Role,
            models::RegisterRequest,
            models::LoginRequest,
            models::AuthResponse,
            models::UserResponse,
            // Companies
            models::CompanyResponse,
            models::CompanyListResponse,
            models::CreateCompanyRequest,
            // Offers
            models::ContractType,
            models::ExperienceLevel,
            models::RemotePolicy,
            models::DisabilityCategory,
            models::OfferStatus,
            models::Offer,
            models::OfferResponse,
            models::OfferListResponse,
            models::RecruiterOffersResponse,
            models::CreateOfferRequest,
            models::UpdateOfferRequest,
            // Applications
            models::ApplicationStatus,
            models::ApplicantSummary,
            models::ApplicationResponse,
            models::ApplicationListResponse,
            models::CreateApplicationRequest,
            models::UpdateStatusRequest,
            models::SubmissionReadiness,
            models::BulkViewResponse,
            // Documents
            models::DocumentType,
            models::DocumentResponse,
            models::DocumentListResponse,
            models::DocumentUploadForm,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Registration, login and sessions"),
        (name = "Companies", description = "Company directory"),
        (name = "Offers", description = "Job offer catalog"),
        (name = "Applications", description = "Application workflow"),
        (name = "Documents", description = "CV and cover letter storage")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
