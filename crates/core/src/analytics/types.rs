//! Snapshot inputs consumed by the metric collectors.
//!
//! The database layer loads one [`ProjectSnapshot`] per analysis request;
//! every collector is a pure function over it. No collector touches a store.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Not started.
    Pending,
    /// Actively running.
    InProgress,
    /// Finished.
    Completed,
    /// Paused.
    OnHold,
}

impl ProjectStatus {
    /// Whether the project participates in bulk forecasting.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

/// Milestone status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    /// Not started.
    Pending,
    /// Actively running.
    InProgress,
    /// Finished.
    Completed,
    /// Paused.
    OnHold,
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    Todo,
    /// Being worked.
    InProgress,
    /// Blocked on something.
    Blocked,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Statuses that count toward the overdue set.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Todo | Self::InProgress | Self::Blocked)
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Lowest.
    Low,
    /// Default.
    Medium,
    /// Elevated.
    High,
    /// Highest.
    Urgent,
}

impl TaskPriority {
    /// Workload weight used by the blocker predictor.
    #[must_use]
    pub const fn workload_weight(self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

/// Risk impact / level scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
}

/// Risk lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    /// Raised and unhandled.
    Open,
    /// Mitigation in progress.
    Mitigating,
    /// Resolved.
    Closed,
}

/// Expense approval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseStatus {
    /// Awaiting approval.
    Pending,
    /// Approved, not yet paid.
    Approved,
    /// Paid out.
    Paid,
}

/// Project header fields used by collectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Project ID.
    pub id: i64,
    /// Project name.
    pub name: String,
    /// Owning company ID.
    pub company_id: i64,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// Planned start date.
    pub start_date: Option<NaiveDate>,
    /// Planned end date.
    pub end_date: Option<NaiveDate>,
    /// Monetary budget.
    pub budget: Decimal,
}

/// Milestone as seen by collectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneRecord {
    /// Milestone ID.
    pub id: i64,
    /// Milestone name.
    pub name: String,
    /// Ordering within the project.
    pub order_index: i32,
    /// Lifecycle status.
    pub status: MilestoneStatus,
    /// Planned start date.
    pub start_date: Option<NaiveDate>,
    /// Planned end date.
    pub end_date: Option<NaiveDate>,
}

/// Task as seen by collectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task ID.
    pub id: i64,
    /// Parent milestone ID.
    pub milestone_id: i64,
    /// Assignee, if any.
    pub assignee_id: Option<i64>,
    /// Assignee display name.
    pub assignee_name: Option<String>,
    /// Priority.
    pub priority: TaskPriority,
    /// Status.
    pub status: TaskStatus,
    /// Progress 0-100 (subtask-derived when subtasks exist).
    pub progress: i32,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Risk as seen by collectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRecord {
    /// Risk ID.
    pub id: i64,
    /// Short title.
    pub title: String,
    /// Category tag.
    pub category: String,
    /// Impact scale.
    pub impact: RiskLevel,
    /// Probability as an integer percentage 0-100.
    pub probability: i32,
    /// Overall level.
    pub level: RiskLevel,
    /// Lifecycle status.
    pub status: RiskStatus,
    /// Whether an AI-generated mitigation exists.
    pub has_ai_mitigation: bool,
    /// Whether a manually authored mitigation exists.
    pub has_manual_mitigation: bool,
}

impl RiskRecord {
    /// A risk with neither mitigation attached.
    #[must_use]
    pub const fn is_unmitigated(&self) -> bool {
        !self.has_ai_mitigation && !self.has_manual_mitigation
    }
}

/// Expense as seen by collectors and the forecaster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Expense ID.
    pub id: i64,
    /// Monetary amount.
    pub amount: Decimal,
    /// Expense date.
    pub date: NaiveDate,
    /// Category tag.
    pub category: String,
    /// Approval status. Forecasting treats all statuses equally.
    pub status: ExpenseStatus,
}

/// A dated change request with its workflow stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequestRecord {
    /// Creation date.
    pub date: NaiveDate,
    /// Workflow stage tag.
    pub stage: String,
}

/// A dated deployment with its readiness flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Deployment date.
    pub date: NaiveDate,
    /// Whether the deployment is marked ready.
    pub ready: bool,
}

/// Dated records for the contextual collector. Each vector carries the
/// creation dates of one collaborator-owned entity kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextRecords {
    /// Stakeholder registrations.
    pub stakeholders: Vec<NaiveDate>,
    /// Change requests with workflow stages.
    pub change_requests: Vec<ChangeRequestRecord>,
    /// Meetings held.
    pub meetings: Vec<NaiveDate>,
    /// Deployments.
    pub deployments: Vec<DeploymentRecord>,
    /// Survey responses.
    pub surveys: Vec<NaiveDate>,
    /// Activity log entries.
    pub activities: Vec<NaiveDate>,
    /// Documents uploaded.
    pub documents: Vec<NaiveDate>,
}

/// Everything the collectors need for one project, loaded in a single read
/// transaction before any LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Project header.
    pub project: ProjectInfo,
    /// Milestones, ordered by `order_index`.
    pub milestones: Vec<MilestoneRecord>,
    /// All tasks across milestones.
    pub tasks: Vec<TaskRecord>,
    /// All risks.
    pub risks: Vec<RiskRecord>,
    /// All expenses.
    pub expenses: Vec<ExpenseRecord>,
    /// Contextual records.
    pub context: ContextRecords,
    /// Active team member count.
    pub team_size: u64,
}
