//! Offer entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "offers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub location: String,
    /// JSON array of contract types, e.g. `["CDI","ALTERNANCE"]`
    #[sea_orm(column_type = "Json")]
    pub contract: Json,
    pub experience: String,
    pub remote: String,
    /// JSON array of disability categories
    #[sea_orm(column_type = "Json")]
    pub disability_compatible: Json,
    /// ACTIVE or PAUSED
    pub status: String,
    pub company_id: Uuid,
    pub recruiter_id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id",
        on_delete = "Cascade"
    )]
    Company,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecruiterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recruiter,
    #[sea_orm(has_many = "super::application::Entity")]
    Applications,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::application::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
