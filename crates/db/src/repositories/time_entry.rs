//! Time entry repository for database operations.
//!
//! Entries snapshot the member's hourly rate at logging time, so later
//! rate changes never rewrite historical labor cost. Workflow:
//! draft -> submitted -> approved | rejected.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use thiserror::Error;

use crate::entities::{
    milestones, sea_orm_active_enums::TimeEntryStatus, tasks, time_entries, users,
};

/// Time entry workflow failures.
#[derive(Debug, Error)]
pub enum TimeEntryError {
    /// The entry does not exist.
    #[error("time entry not found")]
    NotFound,
    /// The entry is not in the state the transition requires.
    #[error("time entry is {actual}, expected {expected}")]
    InvalidState {
        /// Required status.
        expected: &'static str,
        /// Observed status.
        actual: String,
    },
    /// Underlying database failure.
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Time entry repository for logging and the approval workflow.
#[derive(Debug, Clone)]
pub struct TimeEntryRepository {
    db: DatabaseConnection,
}

impl TimeEntryRepository {
    /// Creates a new time entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Logs a draft entry, snapshotting the member's current hourly rate.
    /// Members without a rate are logged at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or an insert fails.
    pub async fn log(
        &self,
        task_id: i64,
        user_id: i64,
        hours: Decimal,
        entry_date: NaiveDate,
        note: Option<String>,
    ) -> Result<time_entries::Model, TimeEntryError> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(TimeEntryError::NotFound)?;

        let now = chrono::Utc::now().into();

        let entry = time_entries::ActiveModel {
            id: sea_orm::NotSet,
            task_id: Set(task_id),
            user_id: Set(user_id),
            hours: Set(hours),
            hourly_rate: Set(user.hourly_rate.unwrap_or(Decimal::ZERO)),
            entry_date: Set(entry_date),
            status: Set(TimeEntryStatus::Draft),
            note: Set(note),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(entry.insert(&self.db).await?)
    }

    /// Submits a draft entry for approval.
    ///
    /// # Errors
    ///
    /// Returns [`TimeEntryError::InvalidState`] unless the entry is a draft.
    pub async fn submit(&self, entry_id: i64) -> Result<time_entries::Model, TimeEntryError> {
        self.transition(entry_id, TimeEntryStatus::Draft, TimeEntryStatus::Submitted)
            .await
    }

    /// Approves a submitted entry.
    ///
    /// # Errors
    ///
    /// Returns [`TimeEntryError::InvalidState`] unless the entry is submitted.
    pub async fn approve(&self, entry_id: i64) -> Result<time_entries::Model, TimeEntryError> {
        self.transition(entry_id, TimeEntryStatus::Submitted, TimeEntryStatus::Approved)
            .await
    }

    /// Rejects a submitted entry.
    ///
    /// # Errors
    ///
    /// Returns [`TimeEntryError::InvalidState`] unless the entry is submitted.
    pub async fn reject(&self, entry_id: i64) -> Result<time_entries::Model, TimeEntryError> {
        self.transition(entry_id, TimeEntryStatus::Submitted, TimeEntryStatus::Rejected)
            .await
    }

    async fn transition(
        &self,
        entry_id: i64,
        expected: TimeEntryStatus,
        next: TimeEntryStatus,
    ) -> Result<time_entries::Model, TimeEntryError> {
        let entry = time_entries::Entity::find_by_id(entry_id)
            .one(&self.db)
            .await?
            .ok_or(TimeEntryError::NotFound)?;

        if entry.status != expected {
            return Err(TimeEntryError::InvalidState {
                expected: expected.as_str(),
                actual: entry.status.as_str().to_string(),
            });
        }

        let mut active: time_entries::ActiveModel = entry.into();
        active.status = Set(next);
        active.updated_at = Set(chrono::Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Lists a user's entries on one task, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_for_task(
        &self,
        task_id: i64,
    ) -> Result<Vec<time_entries::Model>, DbErr> {
        time_entries::Entity::find()
            .filter(time_entries::Column::TaskId.eq(task_id))
            .order_by_desc(time_entries::Column::EntryDate)
            .all(&self.db)
            .await
    }

    /// Sums approved labor cost for a project: `hours * snapshotted rate`
    /// over every approved entry on the project's tasks.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn approved_labor_cost(&self, project_id: i64) -> Result<Decimal, DbErr> {
        let entries = time_entries::Entity::find()
            .join(JoinType::InnerJoin, time_entries::Relation::Tasks.def())
            .join(JoinType::InnerJoin, tasks::Relation::Milestones.def())
            .filter(milestones::Column::ProjectId.eq(project_id))
            .filter(time_entries::Column::Status.eq(TimeEntryStatus::Approved))
            .all(&self.db)
            .await?;

        Ok(entries
            .iter()
            .map(|e| e.hours * e.hourly_rate)
            .sum::<Decimal>())
    }
}
