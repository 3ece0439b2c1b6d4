//! Create offers table.

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_companies::Company;
use super::m20261001_000002_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Offer::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Offer::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Offer::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Offer::Description).text().not_null())
                    .col(ColumnDef::new(Offer::Location).string_len(255).not_null())
                    .col(ColumnDef::new(Offer::Contract).json().not_null())
                    .col(ColumnDef::new(Offer::Experience).string_len(20).not_null())
                    .col(ColumnDef::new(Offer::Remote).string_len(20).not_null())
                    .col(ColumnDef::new(Offer::DisabilityCompatible).json().not_null())
                    .col(
                        ColumnDef::new(Offer::Status)
                            .string_len(20)
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(ColumnDef::new(Offer::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Offer::RecruiterId).uuid().not_null())
                    .col(
                        ColumnDef::new(Offer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Offer::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Offer::Table, Offer::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Offer::Table, Offer::RecruiterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_offers_status_created_at")
                    .table(Offer::Table)
                    .col(Offer::Status)
                    .col(Offer::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_offers_recruiter_id")
                    .table(Offer::Table)
                    .col(Offer::RecruiterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_offers_company_id")
                    .table(Offer::Table)
                    .col(Offer::CompanyId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Offer::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Offer {
    #[sea_orm(iden = "offers")]
    Table,
    Id,
    Title,
    Description,
    Location,
    Contract,
    Experience,
    Remote,
    DisabilityCompatible,
    Status,
    CompanyId,
    RecruiterId,
    CreatedAt,
    UpdatedAt,
}
