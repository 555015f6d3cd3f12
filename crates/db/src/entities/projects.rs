//! `SeaORM` Entity for the projects table.
//!
//! The seven health color columns hold hex tokens and are written together in
//! a single UPDATE alongside `last_analysis_date`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ProjectStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub methodology: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub budget: Decimal,
    pub scope_color: String,
    pub time_color: String,
    pub cost_color: String,
    pub cash_flow_color: String,
    pub safety_color: String,
    pub risk_color: String,
    pub quality_color: String,
    pub last_analysis_date: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Companies,
    #[sea_orm(has_many = "super::milestones::Entity")]
    Milestones,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
    #[sea_orm(has_many = "super::risks::Entity")]
    Risks,
    #[sea_orm(has_many = "super::project_teams::Entity")]
    ProjectTeams,
    #[sea_orm(has_many = "super::documents::Entity")]
    Documents,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Companies.def()
    }
}

impl Related<super::milestones::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Milestones.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::risks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Risks.def()
    }
}

impl Related<super::project_teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectTeams.def()
    }
}

impl Related<super::documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
