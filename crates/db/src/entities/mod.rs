//! `SeaORM` entity definitions.

pub mod activities;
pub mod change_requests;
pub mod companies;
pub mod deployments;
pub mod documents;
pub mod expenses;
pub mod meetings;
pub mod milestones;
pub mod project_teams;
pub mod projects;
pub mod risk_mitigations;
pub mod risks;
pub mod sea_orm_active_enums;
pub mod stakeholders;
pub mod subscriptions;
pub mod subtasks;
pub mod surveys;
pub mod tasks;
pub mod time_entries;
pub mod users;
