//! Database queries for users.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::offer::{self, Entity as Offer};
use crate::entity::user::{self, ActiveModel, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Role, User};

use super::{DbPool, conflict_or_db, parse_column};

/// Fields of a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub company_id: Option<Uuid>,
}

pub(crate) fn model_to_user(m: user::Model) -> AppResult<User> {
    Ok(User {
        id: m.id,
        role: parse_column(&m.role, Role::parse, "users.role")?,
        email: m.email,
        password_hash: m.password_hash,
        first_name: m.first_name,
        last_name: m.last_name,
        company_id: m.company_id,
        created_at: m.created_at,
    })
}

impl DbPool {
    /// Insert a user. A taken email gives `Conflict`.
    pub async fn insert_user(&self, new_user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            role: Set(new_user.role.as_str().to_string()),
            company_id: Set(new_user.company_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(self.connection()).await.map_err(|e| {
            conflict_or_db(e, "Failed to insert user", "Email is already registered")
        })?;

        model_to_user(inserted)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user: {}", e)))?
            .map(model_to_user)
            .transpose()
    }

    /// Get a user by (lower-cased) email.
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        UserEntity::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user by email: {}", e)))?
            .map(model_to_user)
            .transpose()
    }

    /// List every user, oldest first.
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        UserEntity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))?
            .into_iter()
            .map(model_to_user)
            .collect()
    }

    /// Load several users at once, keyed by id.
    pub async fn get_users_by_ids(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get users: {}", e)))?;

        models
            .into_iter()
            .map(|m| model_to_user(m).map(|u| (u.id, u)))
            .collect()
    }

    /// Attach a user to a company.
    pub async fn set_user_company(&self, user_id: Uuid, company_id: Uuid) -> AppResult<()> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::CompanyId, Expr::value(Some(company_id)))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(user_id))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to set user company: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("User {}", user_id)));
        }
        Ok(())
    }

    /// Give every recruiter without a company the company of their most
    /// recent offer. Returns the number of recruiters updated.
    pub async fn backfill_recruiter_companies(&self) -> AppResult<u64> {
        let recruiters = UserEntity::find()
            .filter(user::Column::Role.eq(Role::Recruiter.as_str()))
            .filter(user::Column::CompanyId.is_null())
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list recruiters: {}", e)))?;

        let mut updated = 0;
        for recruiter in recruiters {
            let latest = Offer::find()
                .filter(offer::Column::RecruiterId.eq(recruiter.id))
                .order_by_desc(offer::Column::CreatedAt)
                .order_by_desc(offer::Column::Id)
                .one(self.connection())
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to get latest offer: {}", e))
                })?;

            let Some(latest) = latest else {
                tracing::debug!("Recruiter {} has no offers, skipping", recruiter.id);
                continue;
            };

            self.set_user_company(recruiter.id, latest.company_id).await?;
            tracing::info!(
                "Recruiter {} attached to company {}",
                recruiter.email,
                latest.company_id
            );
            updated += 1;
        }

        Ok(updated)
    }
}
