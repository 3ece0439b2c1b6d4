//! Database queries for offers, including the cascading delete.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::entity::application::{self, Entity as Application};
use crate::entity::application_document::{self, Entity as ApplicationDocument};
use crate::entity::offer::{self, ActiveModel, Entity as OfferEntity};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateOfferRequest, ExperienceLevel, Offer, OfferFilter, OfferStatus, RemotePolicy,
};

use super::{DbPool, parse_column};

/// Rows removed by an offer deletion.
#[derive(Debug, Default)]
pub struct OfferDeletion {
    pub applications: u64,
    pub documents: u64,
    /// Storage keys of the removed documents, to delete after commit
    pub storage_keys: Vec<String>,
}

fn to_json<T: Serialize>(values: &[T], column: &str) -> AppResult<serde_json::Value> {
    serde_json::to_value(values)
        .map_err(|e| AppError::Database(format!("Failed to encode {}: {}", column, e)))
}

fn from_json<T: DeserializeOwned>(value: serde_json::Value, column: &str) -> AppResult<Vec<T>> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Database(format!("Unexpected value in column {}: {}", column, e)))
}

/// Case-insensitive substring match of a column against a lowercased needle.
///
/// `LOWER(..) LIKE` with an explicit escape runs on both PostgreSQL and SQLite.
fn lower_contains(column: offer::Column, needle: &str) -> Condition {
    use sea_orm::sea_query::{ExprTrait, Func, LikeExpr};

    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = LikeExpr::new(format!("%{}%", escaped)).escape('\\');
    Condition::all().add(Expr::expr(Func::lower(Expr::col((OfferEntity, column)))).like(pattern))
}

pub(crate) fn model_to_offer(m: offer::Model) -> AppResult<Offer> {
    Ok(Offer {
        id: m.id,
        contract: from_json(m.contract, "offers.contract")?,
        experience: parse_column(&m.experience, ExperienceLevel::parse, "offers.experience")?,
        remote: parse_column(&m.remote, RemotePolicy::parse, "offers.remote")?,
        disability_compatible: from_json(m.disability_compatible, "offers.disability_compatible")?,
        status: parse_column(&m.status, OfferStatus::parse, "offers.status")?,
        title: m.title,
        description: m.description,
        location: m.location,
        company_id: m.company_id,
        recruiter_id: m.recruiter_id,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

impl DbPool {
    /// Insert a new offer for a recruiter.
    pub async fn insert_offer(
        &self,
        req: &CreateOfferRequest,
        company_id: Uuid,
        recruiter_id: Uuid,
    ) -> AppResult<Offer> {
        let now = Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            title: Set(req.title.clone()),
            description: Set(req.description.clone()),
            location: Set(req.location.clone()),
            contract: Set(to_json(&req.contract, "offers.contract")?),
            experience: Set(req.experience.as_str().to_string()),
            remote: Set(req.remote.as_str().to_string()),
            disability_compatible: Set(to_json(
                &req.disability_compatible,
                "offers.disability_compatible",
            )?),
            status: Set(req.status.as_str().to_string()),
            company_id: Set(company_id),
            recruiter_id: Set(recruiter_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert offer: {}", e)))?;

        model_to_offer(inserted)
    }

    /// Get an offer by ID.
    pub async fn get_offer(&self, id: Uuid) -> AppResult<Option<Offer>> {
        OfferEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get offer: {}", e)))?
            .map(model_to_offer)
            .transpose()
    }

    /// Load several offers at once, keyed by id.
    pub async fn get_offers_by_ids(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Offer>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = OfferEntity::find()
            .filter(offer::Column::Id.is_in(ids.iter().copied()))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get offers: {}", e)))?;

        models
            .into_iter()
            .map(|m| model_to_offer(m).map(|o| (o.id, o)))
            .collect()
    }

    /// Persist every mutable field of an offer and bump `updated_at`.
    pub async fn update_offer(&self, offer: &Offer) -> AppResult<Offer> {
        let model = ActiveModel {
            id: Set(offer.id),
            title: Set(offer.title.clone()),
            description: Set(offer.description.clone()),
            location: Set(offer.location.clone()),
            contract: Set(to_json(&offer.contract, "offers.contract")?),
            experience: Set(offer.experience.as_str().to_string()),
            remote: Set(offer.remote.as_str().to_string()),
            disability_compatible: Set(to_json(
                &offer.disability_compatible,
                "offers.disability_compatible",
            )?),
            status: Set(offer.status.as_str().to_string()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        let updated = model
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update offer: {}", e)))?;

        model_to_offer(updated)
    }

    /// Page through active offers matching a filter, newest first.
    ///
    /// Scalar and text criteria run in SQL. Contract and disability sets are
    /// stored as JSON arrays, so when either is requested the SQL matches are
    /// narrowed on loaded rows. Returns the page and the total match count.
    pub async fn list_active_offers(
        &self,
        filter: &OfferFilter,
        offset: usize,
        limit: usize,
    ) -> AppResult<(Vec<Offer>, u64)> {
        let mut query = OfferEntity::find()
            .filter(offer::Column::Status.eq(OfferStatus::Active.as_str()))
            .order_by_desc(offer::Column::CreatedAt)
            .order_by_desc(offer::Column::Id);

        if let Some(company_id) = filter.company_id {
            query = query.filter(offer::Column::CompanyId.eq(company_id));
        }
        if let Some(experience) = filter.experience {
            query = query.filter(offer::Column::Experience.eq(experience.as_str()));
        }
        if let Some(remote) = filter.remote {
            query = query.filter(offer::Column::Remote.eq(remote.as_str()));
        }
        if let Some(ref needle) = filter.search {
            query = query.filter(
                Condition::any()
                    .add(lower_contains(offer::Column::Title, needle))
                    .add(lower_contains(offer::Column::Description, needle))
                    .add(lower_contains(offer::Column::Location, needle)),
            );
        }
        if let Some(ref location) = filter.location {
            query = query.filter(lower_contains(offer::Column::Location, location));
        }

        if filter.contracts.is_empty() && filter.disabilities.is_empty() {
            let total = query
                .clone()
                .count(self.connection())
                .await
                .map_err(|e| AppError::Database(format!("Failed to count offers: {}", e)))?;
            let page = query
                .offset(offset as u64)
                .limit(limit as u64)
                .all(self.connection())
                .await
                .map_err(|e| AppError::Database(format!("Failed to list offers: {}", e)))?
                .into_iter()
                .map(model_to_offer)
                .collect::<AppResult<Vec<_>>>()?;
            return Ok((page, total));
        }

        let models = query
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list offers: {}", e)))?;

        let mut matching = Vec::new();
        for m in models {
            let offer = model_to_offer(m)?;
            if filter.matches(&offer) {
                matching.push(offer);
            }
        }

        let total = matching.len() as u64;
        let page = matching.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    /// Every offer of a recruiter (any status), newest first.
    pub async fn list_offers_by_recruiter(&self, recruiter_id: Uuid) -> AppResult<Vec<Offer>> {
        OfferEntity::find()
            .filter(offer::Column::RecruiterId.eq(recruiter_id))
            .order_by_desc(offer::Column::CreatedAt)
            .order_by_desc(offer::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list recruiter offers: {}", e)))?
            .into_iter()
            .map(model_to_offer)
            .collect()
    }

    /// Delete an offer with its applications and documents in one transaction.
    ///
    /// Returns the storage keys of the deleted documents; the caller removes
    /// the stored objects once the transaction has committed.
    pub async fn delete_offer_cascade(&self, offer_id: Uuid) -> AppResult<OfferDeletion> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let application_ids: Vec<Uuid> = Application::find()
            .select_only()
            .column(application::Column::Id)
            .filter(application::Column::OfferId.eq(offer_id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to list applications: {}", e)))?;

        let mut deletion = OfferDeletion::default();

        if !application_ids.is_empty() {
            deletion.storage_keys = ApplicationDocument::find()
                .select_only()
                .column(application_document::Column::StorageKey)
                .filter(
                    application_document::Column::ApplicationId
                        .is_in(application_ids.iter().copied()),
                )
                .into_tuple()
                .all(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to list documents: {}", e)))?;

            deletion.documents = ApplicationDocument::delete_many()
                .filter(
                    application_document::Column::ApplicationId
                        .is_in(application_ids.iter().copied()),
                )
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(format!("Failed to delete documents: {}", e)))?
                .rows_affected;

            deletion.applications = Application::delete_many()
                .filter(application::Column::OfferId.eq(offer_id))
                .exec(&txn)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to delete applications: {}", e))
                })?
                .rows_affected;
        }

        let deleted = OfferEntity::delete_by_id(offer_id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete offer: {}", e)))?;

        if deleted.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(format!("Failed to roll back: {}", e)))?;
            return Err(AppError::NotFound(format!("Offer {}", offer_id)));
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit offer deletion: {}", e)))?;

        Ok(deletion)
    }
}
