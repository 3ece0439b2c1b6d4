//! Offer catalog models and the listing filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::Pagination;

/// Contract type of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractType {
    Cdi,
    Cdd,
    Interim,
    Stage,
    Alternance,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cdi => "CDI",
            Self::Cdd => "CDD",
            Self::Interim => "INTERIM",
            Self::Stage => "STAGE",
            Self::Alternance => "ALTERNANCE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CDI" => Some(Self::Cdi),
            "CDD" => Some(Self::Cdd),
            "INTERIM" => Some(Self::Interim),
            "STAGE" => Some(Self::Stage),
            "ALTERNANCE" => Some(Self::Alternance),
            _ => None,
        }
    }
}

/// Required experience level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperienceLevel {
    Junior,
    Confirme,
    Senior,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "JUNIOR",
            Self::Confirme => "CONFIRME",
            Self::Senior => "SENIOR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "JUNIOR" => Some(Self::Junior),
            "CONFIRME" => Some(Self::Confirme),
            "SENIOR" => Some(Self::Senior),
            _ => None,
        }
    }
}

/// Remote work policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemotePolicy {
    NoRemote,
    Hybrid,
    FullRemote,
}

impl RemotePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoRemote => "NO_REMOTE",
            Self::Hybrid => "HYBRID",
            Self::FullRemote => "FULL_REMOTE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NO_REMOTE" => Some(Self::NoRemote),
            "HYBRID" => Some(Self::Hybrid),
            "FULL_REMOTE" => Some(Self::FullRemote),
            _ => None,
        }
    }
}

/// Disability categories a position is declared compatible with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisabilityCategory {
    Moteur,
    Visuel,
    Auditif,
    Psychique,
    Cognitif,
    MaladieInvalidante,
}

impl DisabilityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moteur => "MOTEUR",
            Self::Visuel => "VISUEL",
            Self::Auditif => "AUDITIF",
            Self::Psychique => "PSYCHIQUE",
            Self::Cognitif => "COGNITIF",
            Self::MaladieInvalidante => "MALADIE_INVALIDANTE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MOTEUR" => Some(Self::Moteur),
            "VISUEL" => Some(Self::Visuel),
            "AUDITIF" => Some(Self::Auditif),
            "PSYCHIQUE" => Some(Self::Psychique),
            "COGNITIF" => Some(Self::Cognitif),
            "MALADIE_INVALIDANTE" => Some(Self::MaladieInvalidante),
            _ => None,
        }
    }
}

/// Publication status of an offer. Paused offers accept no new applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    #[default]
    Active,
    Paused,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => Some(Self::Active),
            "PAUSED" => Some(Self::Paused),
            _ => None,
        }
    }
}

/// Job posting.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub contract: Vec<ContractType>,
    pub experience: ExperienceLevel,
    pub remote: RemotePolicy,
    pub disability_compatible: Vec<DisabilityCategory>,
    pub status: OfferStatus,
    pub company_id: Uuid,
    pub recruiter_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_active(&self) -> bool {
        self.status == OfferStatus::Active
    }
}

/// Offer enriched for display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    #[serde(flatten)]
    pub offer: Offer,
    pub company_name: Option<String>,
    /// Only filled for the owning recruiter's views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_count: Option<u64>,
}

/// Request body for POST /offers.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub title: String,
    pub description: String,
    pub location: String,
    pub contract: Vec<ContractType>,
    pub experience: ExperienceLevel,
    pub remote: RemotePolicy,
    #[serde(default)]
    pub disability_compatible: Vec<DisabilityCategory>,
    #[serde(default)]
    pub status: OfferStatus,
}

impl CreateOfferRequest {
    pub fn validate(&mut self) -> Result<(), String> {
        self.title = self.title.trim().to_string();
        self.location = self.location.trim().to_string();
        dedup(&mut self.contract);
        dedup(&mut self.disability_compatible);

        if self.title.is_empty() {
            return Err("Offer title is required".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("Offer description is required".to_string());
        }
        if self.location.is_empty() {
            return Err("Offer location is required".to_string());
        }
        if self.contract.is_empty() {
            return Err("At least one contract type is required".to_string());
        }
        Ok(())
    }
}

/// Request body for PUT /offers/{id}. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contract: Option<Vec<ContractType>>,
    pub experience: Option<ExperienceLevel>,
    pub remote: Option<RemotePolicy>,
    pub disability_compatible: Option<Vec<DisabilityCategory>>,
    pub status: Option<OfferStatus>,
}

impl UpdateOfferRequest {
    /// Apply the patch to an offer, validating the resulting values.
    pub fn apply_to(self, offer: &mut Offer) -> Result<(), String> {
        if let Some(title) = self.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err("Offer title cannot be empty".to_string());
            }
            offer.title = title;
        }
        if let Some(description) = self.description {
            if description.trim().is_empty() {
                return Err("Offer description cannot be empty".to_string());
            }
            offer.description = description;
        }
        if let Some(location) = self.location {
            let location = location.trim().to_string();
            if location.is_empty() {
                return Err("Offer location cannot be empty".to_string());
            }
            offer.location = location;
        }
        if let Some(mut contract) = self.contract {
            dedup(&mut contract);
            if contract.is_empty() {
                return Err("At least one contract type is required".to_string());
            }
            offer.contract = contract;
        }
        if let Some(experience) = self.experience {
            offer.experience = experience;
        }
        if let Some(remote) = self.remote {
            offer.remote = remote;
        }
        if let Some(mut categories) = self.disability_compatible {
            dedup(&mut categories);
            offer.disability_compatible = categories;
        }
        if let Some(status) = self.status {
            offer.status = status;
        }
        Ok(())
    }
}

fn dedup<T: PartialEq + Copy>(values: &mut Vec<T>) {
    let mut seen: Vec<T> = Vec::with_capacity(values.len());
    values.retain(|v| {
        if seen.contains(v) {
            false
        } else {
            seen.push(*v);
            true
        }
    });
}

/// Query parameters for GET /offers.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OfferListQuery {
    /// Free text matched against title, description and location
    pub search: Option<String>,
    pub location: Option<String>,
    /// Comma separated contract types, any match (e.g. `CDI,CDD`)
    pub contract: Option<String>,
    pub experience: Option<String>,
    pub remote: Option<String>,
    /// Comma separated disability categories, any match
    pub disability: Option<String>,
    pub company_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

/// Maximum page size for offer listings.
pub const MAX_OFFER_PAGE_SIZE: u32 = 100;

impl OfferListQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(default_page()).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(default_limit())
            .clamp(1, MAX_OFFER_PAGE_SIZE)
    }

    /// Parse the textual query into a typed filter.
    pub fn to_filter(&self) -> Result<OfferFilter, String> {
        let contracts = parse_list(self.contract.as_deref(), ContractType::parse, "contract")?;
        let disabilities = parse_list(
            self.disability.as_deref(),
            DisabilityCategory::parse,
            "disability",
        )?;
        let experience = self
            .experience
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                ExperienceLevel::parse(s).ok_or_else(|| format!("Unknown experience '{}'", s))
            })
            .transpose()?;
        let remote = self
            .remote
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| RemotePolicy::parse(s).ok_or_else(|| format!("Unknown remote '{}'", s)))
            .transpose()?;

        Ok(OfferFilter {
            search: normalize_text(self.search.as_deref()),
            location: normalize_text(self.location.as_deref()),
            contracts,
            experience,
            remote,
            disabilities,
            company_id: self.company_id,
        })
    }
}

fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

fn parse_list<T>(
    raw: Option<&str>,
    parse: fn(&str) -> Option<T>,
    field: &str,
) -> Result<Vec<T>, String> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse(s).ok_or_else(|| format!("Unknown {} '{}'", field, s)))
        .collect()
}

/// Typed search criteria for the public catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferFilter {
    pub search: Option<String>,
    pub location: Option<String>,
    pub contracts: Vec<ContractType>,
    pub experience: Option<ExperienceLevel>,
    pub remote: Option<RemotePolicy>,
    pub disabilities: Vec<DisabilityCategory>,
    pub company_id: Option<Uuid>,
}

impl OfferFilter {
    /// Whether an offer satisfies every criterion of the filter.
    ///
    /// Set-valued criteria (contract, disability) match when the offer shares
    /// at least one value with the filter.
    pub fn matches(&self, offer: &Offer) -> bool {
        if let Some(ref needle) = self.search {
            let hit = offer.title.to_lowercase().contains(needle)
                || offer.description.to_lowercase().contains(needle)
                || offer.location.to_lowercase().contains(needle);
            if !hit {
                return false;
            }
        }
        if let Some(ref location) = self.location
            && !offer.location.to_lowercase().contains(location)
        {
            return false;
        }
        if !self.contracts.is_empty() && !self.contracts.iter().any(|c| offer.contract.contains(c))
        {
            return false;
        }
        if let Some(experience) = self.experience
            && offer.experience != experience
        {
            return false;
        }
        if let Some(remote) = self.remote
            && offer.remote != remote
        {
            return false;
        }
        if !self.disabilities.is_empty()
            && !self
                .disabilities
                .iter()
                .any(|d| offer.disability_compatible.contains(d))
        {
            return false;
        }
        if let Some(company_id) = self.company_id
            && offer.company_id != company_id
        {
            return false;
        }
        true
    }
}

/// Paginated response for GET /offers.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfferListResponse {
    pub offers: Vec<OfferResponse>,
    pub pagination: Pagination,
}

/// Response for GET /offers/mine.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecruiterOffersResponse {
    pub offers: Vec<OfferResponse>,
}
