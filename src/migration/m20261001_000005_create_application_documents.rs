//! Create application_documents table.

use sea_orm_migration::prelude::*;

use super::m20261001_000004_create_applications::Application;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApplicationDocument::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApplicationDocument::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocument::ApplicationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocument::DocumentType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocument::FileName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocument::FileSize)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocument::ContentType)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocument::StorageKey)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocument::Sha256)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApplicationDocument::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                ApplicationDocument::Table,
                                ApplicationDocument::ApplicationId,
                            )
                            .to(Application::Table, Application::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_application_documents_type")
                    .table(ApplicationDocument::Table)
                    .col(ApplicationDocument::ApplicationId)
                    .col(ApplicationDocument::DocumentType)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApplicationDocument::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApplicationDocument {
    #[sea_orm(iden = "application_documents")]
    Table,
    Id,
    ApplicationId,
    DocumentType,
    FileName,
    FileSize,
    ContentType,
    StorageKey,
    Sha256,
    CreatedAt,
}
