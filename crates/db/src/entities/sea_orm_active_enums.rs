//! String-backed enum columns shared across entities.
//!
//! Values are stored as lowercase text with CHECK constraints in the schema
//! rather than native Postgres enums, which keeps additive variants a plain
//! data migration. `From` impls bridge to the core domain enums so
//! repositories never match on strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use projextpal_core::analytics::types as core_types;
use projextpal_core::billing;

/// User role within a company.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "guest")]
    Guest,
    #[sea_orm(string_value = "contributor")]
    Contributor,
    #[sea_orm(string_value = "reviewer")]
    Reviewer,
    #[sea_orm(string_value = "pm")]
    Pm,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "superadmin")]
    Superadmin,
}

impl From<UserRole> for projextpal_shared::Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Guest => Self::Guest,
            UserRole::Contributor => Self::Contributor,
            UserRole::Reviewer => Self::Reviewer,
            UserRole::Pm => Self::Pm,
            UserRole::Admin => Self::Admin,
            UserRole::Superadmin => Self::Superadmin,
        }
    }
}

impl From<projextpal_shared::Role> for UserRole {
    fn from(role: projextpal_shared::Role) -> Self {
        match role {
            projextpal_shared::Role::Guest => Self::Guest,
            projextpal_shared::Role::Contributor => Self::Contributor,
            projextpal_shared::Role::Reviewer => Self::Reviewer,
            projextpal_shared::Role::Pm => Self::Pm,
            projextpal_shared::Role::Admin => Self::Admin,
            projextpal_shared::Role::Superadmin => Self::Superadmin,
        }
    }
}

/// Project lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "on_hold")]
    OnHold,
}

impl From<ProjectStatus> for core_types::ProjectStatus {
    fn from(status: ProjectStatus) -> Self {
        match status {
            ProjectStatus::Pending => Self::Pending,
            ProjectStatus::InProgress => Self::InProgress,
            ProjectStatus::Completed => Self::Completed,
            ProjectStatus::OnHold => Self::OnHold,
        }
    }
}

/// Milestone lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "on_hold")]
    OnHold,
}

impl From<MilestoneStatus> for core_types::MilestoneStatus {
    fn from(status: MilestoneStatus) -> Self {
        match status {
            MilestoneStatus::Pending => Self::Pending,
            MilestoneStatus::InProgress => Self::InProgress,
            MilestoneStatus::Completed => Self::Completed,
            MilestoneStatus::OnHold => Self::OnHold,
        }
    }
}

/// Task status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[sea_orm(string_value = "todo")]
    Todo,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "blocked")]
    Blocked,
    #[sea_orm(string_value = "done")]
    Done,
}

impl From<TaskStatus> for core_types::TaskStatus {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Todo => Self::Todo,
            TaskStatus::InProgress => Self::InProgress,
            TaskStatus::Blocked => Self::Blocked,
            TaskStatus::Done => Self::Done,
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

impl From<TaskPriority> for core_types::TaskPriority {
    fn from(priority: TaskPriority) -> Self {
        match priority {
            TaskPriority::Low => Self::Low,
            TaskPriority::Medium => Self::Medium,
            TaskPriority::High => Self::High,
            TaskPriority::Urgent => Self::Urgent,
        }
    }
}

/// Risk impact / overall level scale.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

impl From<RiskLevel> for core_types::RiskLevel {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => Self::Low,
            RiskLevel::Medium => Self::Medium,
            RiskLevel::High => Self::High,
        }
    }
}

/// Risk lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "mitigating")]
    Mitigating,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl From<RiskStatus> for core_types::RiskStatus {
    fn from(status: RiskStatus) -> Self {
        match status {
            RiskStatus::Open => Self::Open,
            RiskStatus::Mitigating => Self::Mitigating,
            RiskStatus::Closed => Self::Closed,
        }
    }
}

/// Origin of a risk mitigation plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum MitigationSource {
    #[sea_orm(string_value = "ai")]
    Ai,
    #[sea_orm(string_value = "manual")]
    Manual,
}

/// Expense approval status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl From<ExpenseStatus> for core_types::ExpenseStatus {
    fn from(status: ExpenseStatus) -> Self {
        match status {
            ExpenseStatus::Pending => Self::Pending,
            ExpenseStatus::Approved => Self::Approved,
            ExpenseStatus::Paid => Self::Paid,
        }
    }
}

/// Time entry approval status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum TimeEntryStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl TimeEntryStatus {
    /// Stored lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Subscription status mirroring the billing provider.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[sea_orm(string_value = "incomplete")]
    Incomplete,
    #[sea_orm(string_value = "incomplete_expired")]
    IncompleteExpired,
    #[sea_orm(string_value = "trialing")]
    Trialing,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "past_due")]
    PastDue,
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "canceled")]
    Canceled,
    #[sea_orm(string_value = "paused")]
    Paused,
}

impl From<SubscriptionStatus> for billing::SubscriptionStatus {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Incomplete => Self::Incomplete,
            SubscriptionStatus::IncompleteExpired => Self::IncompleteExpired,
            SubscriptionStatus::Trialing => Self::Trialing,
            SubscriptionStatus::Active => Self::Active,
            SubscriptionStatus::PastDue => Self::PastDue,
            SubscriptionStatus::Unpaid => Self::Unpaid,
            SubscriptionStatus::Canceled => Self::Canceled,
            SubscriptionStatus::Paused => Self::Paused,
        }
    }
}

impl From<billing::SubscriptionStatus> for SubscriptionStatus {
    fn from(status: billing::SubscriptionStatus) -> Self {
        match status {
            billing::SubscriptionStatus::Incomplete => Self::Incomplete,
            billing::SubscriptionStatus::IncompleteExpired => Self::IncompleteExpired,
            billing::SubscriptionStatus::Trialing => Self::Trialing,
            billing::SubscriptionStatus::Active => Self::Active,
            billing::SubscriptionStatus::PastDue => Self::PastDue,
            billing::SubscriptionStatus::Unpaid => Self::Unpaid,
            billing::SubscriptionStatus::Canceled => Self::Canceled,
            billing::SubscriptionStatus::Paused => Self::Paused,
        }
    }
}
