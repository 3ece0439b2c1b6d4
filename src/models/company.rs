//! Company directory models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Employer record with the number of offers it publishes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: String,
    pub sector: Option<String>,
    pub offer_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Request body for POST /companies.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub sector: Option<String>,
}

impl CreateCompanyRequest {
    pub fn validate(&mut self) -> Result<(), String> {
        self.name = self.name.trim().to_string();
        self.sector = self
            .sector
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if self.name.is_empty() {
            return Err("Company name is required".to_string());
        }
        if self.name.chars().count() > 200 {
            return Err("Company name must be at most 200 characters".to_string());
        }
        Ok(())
    }
}

/// List response for GET /companies.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompanyListResponse {
    pub companies: Vec<CompanyResponse>,
}
