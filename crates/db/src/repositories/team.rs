//! Project team repository for database operations.
//!
//! Team rows are the cross-tenant bridge: a member may belong to a
//! different company than the project. Membership is soft-deleted through
//! `is_active` so rejoining reactivates the existing row.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::{project_teams, users};

/// Team repository for membership queries and the reactivating upsert.
#[derive(Debug, Clone)]
pub struct TeamRepository {
    db: DatabaseConnection,
}

impl TeamRepository {
    /// Creates a new team repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists a project's active members with their user rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn active_team_members(
        &self,
        project_id: i64,
    ) -> Result<Vec<(project_teams::Model, users::Model)>, DbErr> {
        let rows = project_teams::Entity::find()
            .filter(project_teams::Column::ProjectId.eq(project_id))
            .filter(project_teams::Column::IsActive.eq(true))
            .find_also_related(users::Entity)
            .order_by_asc(project_teams::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(membership, user)| user.map(|u| (membership, u)))
            .collect())
    }

    /// Counts a project's active members.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn team_size(&self, project_id: i64) -> Result<u64, DbErr> {
        project_teams::Entity::find()
            .filter(project_teams::Column::ProjectId.eq(project_id))
            .filter(project_teams::Column::IsActive.eq(true))
            .count(&self.db)
            .await
    }

    /// Checks whether a user is an active member of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_active_member(&self, project_id: i64, user_id: i64) -> Result<bool, DbErr> {
        let count = project_teams::Entity::find()
            .filter(project_teams::Column::ProjectId.eq(project_id))
            .filter(project_teams::Column::UserId.eq(user_id))
            .filter(project_teams::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Adds a user to a project, reactivating a prior membership when one
    /// exists. An optional hourly rate overrides the user's default for
    /// future time entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or update fails.
    pub async fn upsert_member(
        &self,
        project_id: i64,
        user_id: i64,
        hourly_rate: Option<Decimal>,
    ) -> Result<project_teams::Model, DbErr> {
        let now = chrono::Utc::now().into();

        if let Some(hourly_rate) = hourly_rate {
            if let Some(user) = users::Entity::find_by_id(user_id).one(&self.db).await? {
                let mut active: users::ActiveModel = user.into();
                active.hourly_rate = Set(Some(hourly_rate));
                active.updated_at = Set(now);
                active.update(&self.db).await?;
            }
        }

        let existing = project_teams::Entity::find()
            .filter(project_teams::Column::ProjectId.eq(project_id))
            .filter(project_teams::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        if let Some(membership) = existing {
            let mut active: project_teams::ActiveModel = membership.into();
            active.is_active = Set(true);
            active.updated_at = Set(now);
            return active.update(&self.db).await;
        }

        let membership = project_teams::ActiveModel {
            id: NotSet,
            project_id: Set(project_id),
            user_id: Set(user_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        membership.insert(&self.db).await
    }

    /// Deactivates a membership. The row survives for reactivation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn deactivate_member(&self, project_id: i64, user_id: i64) -> Result<(), DbErr> {
        let existing = project_teams::Entity::find()
            .filter(project_teams::Column::ProjectId.eq(project_id))
            .filter(project_teams::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        if let Some(membership) = existing {
            let mut active: project_teams::ActiveModel = membership.into();
            active.is_active = Set(false);
            active.updated_at = Set(chrono::Utc::now().into());
            active.update(&self.db).await?;
        }

        Ok(())
    }
}
