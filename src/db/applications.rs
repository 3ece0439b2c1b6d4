//! Database queries for applications.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::application::{self, ActiveModel, Entity as ApplicationEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Application, ApplicationStatus};

use super::{DbPool, conflict_or_db, parse_column};

pub(crate) fn model_to_application(m: application::Model) -> AppResult<Application> {
    Ok(Application {
        id: m.id,
        user_id: m.user_id,
        offer_id: m.offer_id,
        company_id: m.company_id,
        status: parse_column(&m.status, ApplicationStatus::parse, "applications.status")?,
        viewed_at: m.viewed_at,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn models_to_applications(models: Vec<application::Model>) -> AppResult<Vec<Application>> {
    models.into_iter().map(model_to_application).collect()
}

impl DbPool {
    /// Insert a NOT_VIEWED application. A second application by the same
    /// user to the same offer gives `Conflict`.
    pub async fn insert_application(
        &self,
        user_id: Uuid,
        offer_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Application> {
        let now = Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            offer_id: Set(offer_id),
            company_id: Set(company_id),
            status: Set(ApplicationStatus::NotViewed.as_str().to_string()),
            viewed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(self.connection()).await.map_err(|e| {
            conflict_or_db(
                e,
                "Failed to insert application",
                "You have already applied to this offer",
            )
        })?;

        model_to_application(inserted)
    }

    /// Get an application by ID.
    pub async fn get_application(&self, id: Uuid) -> AppResult<Option<Application>> {
        ApplicationEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get application: {}", e)))?
            .map(model_to_application)
            .transpose()
    }

    /// Applications submitted by a user, newest first.
    pub async fn list_applications_by_user(&self, user_id: Uuid) -> AppResult<Vec<Application>> {
        let models = ApplicationEntity::find()
            .filter(application::Column::UserId.eq(user_id))
            .order_by_desc(application::Column::CreatedAt)
            .order_by_desc(application::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list applications: {}", e)))?;

        models_to_applications(models)
    }

    /// Applications to any of the given offers, newest first.
    pub async fn list_applications_by_offers(
        &self,
        offer_ids: &[Uuid],
    ) -> AppResult<Vec<Application>> {
        if offer_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = ApplicationEntity::find()
            .filter(application::Column::OfferId.is_in(offer_ids.iter().copied()))
            .order_by_desc(application::Column::CreatedAt)
            .order_by_desc(application::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list applications: {}", e)))?;

        models_to_applications(models)
    }

    /// Number of applications per offer.
    pub async fn count_applications_by_offers(
        &self,
        offer_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, u64>> {
        if offer_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = ApplicationEntity::find()
            .select_only()
            .column(application::Column::OfferId)
            .column_as(application::Column::Id.count(), "application_count")
            .filter(application::Column::OfferId.is_in(offer_ids.iter().copied()))
            .group_by(application::Column::OfferId)
            .into_tuple()
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count applications: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }

    /// Move an application from NOT_VIEWED to VIEWED.
    ///
    /// The update is conditional on the current status, so concurrent callers
    /// cannot move it twice. Returns true when this call made the transition.
    pub async fn mark_application_viewed(&self, id: Uuid) -> AppResult<bool> {
        let now = Utc::now();
        let result = ApplicationEntity::update_many()
            .col_expr(
                application::Column::Status,
                Expr::value(ApplicationStatus::Viewed.as_str()),
            )
            .col_expr(application::Column::ViewedAt, Expr::value(Some(now)))
            .col_expr(application::Column::UpdatedAt, Expr::value(now))
            .filter(application::Column::Id.eq(id))
            .filter(application::Column::Status.eq(ApplicationStatus::NotViewed.as_str()))
            .exec(self.connection())
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to mark application viewed: {}", e))
            })?;

        Ok(result.rows_affected == 1)
    }
}
