//! Create applications table.
//!
//! A user applies at most once per offer (unique `user_id, offer_id`).

use sea_orm_migration::prelude::*;

use super::m20261001_000002_create_users::User;
use super::m20261001_000003_create_offers::Offer;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Application::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Application::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Application::UserId).uuid().not_null())
                    .col(ColumnDef::new(Application::OfferId).uuid().not_null())
                    .col(ColumnDef::new(Application::CompanyId).uuid().not_null())
                    .col(
                        ColumnDef::new(Application::Status)
                            .string_len(20)
                            .not_null()
                            .default("NOT_VIEWED"),
                    )
                    .col(ColumnDef::new(Application::ViewedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Application::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Application::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Application::Table, Application::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Application::Table, Application::OfferId)
                            .to(Offer::Table, Offer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_applications_user_offer")
                    .table(Application::Table)
                    .col(Application::UserId)
                    .col(Application::OfferId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_applications_offer_id")
                    .table(Application::Table)
                    .col(Application::OfferId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Application::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Application {
    #[sea_orm(iden = "applications")]
    Table,
    Id,
    UserId,
    OfferId,
    CompanyId,
    Status,
    ViewedAt,
    CreatedAt,
    UpdatedAt,
}
