//! Task and subtask repository for database operations.

use chrono::NaiveDate;
use projextpal_core::progress;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use crate::entities::{
    milestones, sea_orm_active_enums::TaskStatus, subtasks, tasks,
};

/// Task repository covering overdue queries and the subtask progress
/// invariant.
#[derive(Debug, Clone)]
pub struct TaskRepository {
    db: DatabaseConnection,
}

impl TaskRepository {
    /// Creates a new task repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a project's open tasks whose due date has passed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn tasks_overdue(
        &self,
        project_id: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<tasks::Model>, DbErr> {
        tasks::Entity::find()
            .join(JoinType::InnerJoin, tasks::Relation::Milestones.def())
            .filter(milestones::Column::ProjectId.eq(project_id))
            .filter(tasks::Column::DueDate.lt(as_of))
            .filter(tasks::Column::Status.is_in([
                TaskStatus::Todo,
                TaskStatus::InProgress,
                TaskStatus::Blocked,
            ]))
            .order_by_asc(tasks::Column::DueDate)
            .all(&self.db)
            .await
    }

    /// Resolves a task's owning project, for visibility checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn task_project(&self, task_id: i64) -> Result<Option<i64>, DbErr> {
        tasks::Entity::find_by_id(task_id)
            .join(JoinType::InnerJoin, tasks::Relation::Milestones.def())
            .select_only()
            .column(milestones::Column::ProjectId)
            .into_tuple()
            .one(&self.db)
            .await
    }

    /// Resolves a subtask's parent task and owning project, for visibility
    /// checks before mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn subtask_parent(&self, subtask_id: i64) -> Result<Option<(i64, i64)>, DbErr> {
        subtasks::Entity::find_by_id(subtask_id)
            .join(JoinType::InnerJoin, subtasks::Relation::Tasks.def())
            .join(JoinType::InnerJoin, tasks::Relation::Milestones.def())
            .select_only()
            .column(subtasks::Column::TaskId)
            .column(milestones::Column::ProjectId)
            .into_tuple()
            .one(&self.db)
            .await
    }

    /// Toggles one subtask and recomputes the parent task's progress in the
    /// same transaction, so the stored progress never drifts from the
    /// subtask set. Returns the updated parent task, or `None` when the
    /// subtask does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; the transaction rolls back.
    pub async fn set_subtask_completed(
        &self,
        subtask_id: i64,
        completed: bool,
    ) -> Result<Option<tasks::Model>, DbErr> {
        let txn = self.db.begin().await?;

        let Some(subtask) = subtasks::Entity::find_by_id(subtask_id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(None);
        };

        let task_id = subtask.task_id;
        let now = chrono::Utc::now().into();

        let mut active: subtasks::ActiveModel = subtask.into();
        active.is_completed = Set(completed);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        let task = tasks::Entity::find_by_id(task_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("task {task_id}")))?;

        let flags: Vec<bool> = subtasks::Entity::find()
            .filter(subtasks::Column::TaskId.eq(task_id))
            .order_by_asc(subtasks::Column::Id)
            .all(&txn)
            .await?
            .into_iter()
            .map(|s| s.is_completed)
            .collect();

        let new_progress = progress::task_progress(&flags, task.progress);

        let mut active: tasks::ActiveModel = task.into();
        active.progress = Set(new_progress);
        active.updated_at = Set(now);
        let task = active.update(&txn).await?;

        txn.commit().await?;

        Ok(Some(task))
    }
}
