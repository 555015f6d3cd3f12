//! `SeaORM` Entity for the risk_mitigations table.
//!
//! One row per (risk, source): a risk holds at most one AI-generated and one
//! manually authored mitigation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::MitigationSource;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "risk_mitigations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub risk_id: i64,
    pub source: MitigationSource,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::risks::Entity",
        from = "Column::RiskId",
        to = "super::risks::Column::Id"
    )]
    Risks,
}

impl Related<super::risks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Risks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
