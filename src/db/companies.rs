//! Database queries for companies.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::company::{self, ActiveModel, Entity as Company};
use crate::entity::offer::{self, Entity as Offer};
use crate::error::{AppError, AppResult};
use crate::models::{CompanyResponse, OfferStatus};

use super::{DbPool, conflict_or_db};

fn to_response(m: company::Model, offer_count: u64) -> CompanyResponse {
    CompanyResponse {
        id: m.id,
        name: m.name,
        sector: m.sector,
        offer_count,
        created_at: m.created_at,
    }
}

impl DbPool {
    /// Insert a company. Names are unique ignoring case.
    pub async fn insert_company(
        &self,
        name: &str,
        sector: Option<&str>,
    ) -> AppResult<company::Model> {
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            name_key: Set(name.to_lowercase()),
            sector: Set(sector.map(|s| s.to_string())),
            created_at: Set(Utc::now()),
        };

        model.insert(self.connection()).await.map_err(|e| {
            conflict_or_db(
                e,
                "Failed to insert company",
                &format!("Company '{}' already exists", name),
            )
        })
    }

    /// Get a company by ID.
    pub async fn get_company(&self, id: Uuid) -> AppResult<Option<company::Model>> {
        Company::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get company: {}", e)))
    }

    /// Get a company with its number of active offers.
    pub async fn get_company_with_offer_count(
        &self,
        id: Uuid,
    ) -> AppResult<Option<CompanyResponse>> {
        let Some(model) = self.get_company(id).await? else {
            return Ok(None);
        };
        let counts = self.active_offer_counts(Some(id)).await?;
        let count = counts.get(&id).copied().unwrap_or(0);
        Ok(Some(to_response(model, count)))
    }

    /// All companies sorted by name, each with its number of active offers.
    pub async fn list_companies_with_offer_counts(&self) -> AppResult<Vec<CompanyResponse>> {
        let companies = Company::find()
            .order_by_asc(company::Column::NameKey)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list companies: {}", e)))?;

        let counts = self.active_offer_counts(None).await?;

        Ok(companies
            .into_iter()
            .map(|m| {
                let count = counts.get(&m.id).copied().unwrap_or(0);
                to_response(m, count)
            })
            .collect())
    }

    /// Company names keyed by id.
    pub async fn get_company_names(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, String)> = Company::find()
            .select_only()
            .column(company::Column::Id)
            .column(company::Column::Name)
            .filter(company::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get company names: {}", e)))?;

        Ok(rows.into_iter().collect())
    }

    async fn active_offer_counts(&self, company_id: Option<Uuid>) -> AppResult<HashMap<Uuid, u64>> {
        let mut query = Offer::find()
            .select_only()
            .column(offer::Column::CompanyId)
            .column_as(offer::Column::Id.count(), "offer_count")
            .filter(offer::Column::Status.eq(OfferStatus::Active.as_str()))
            .group_by(offer::Column::CompanyId);

        if let Some(id) = company_id {
            query = query.filter(offer::Column::CompanyId.eq(id));
        }

        let rows: Vec<(Uuid, i64)> = query
            .into_tuple()
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count offers: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }
}
