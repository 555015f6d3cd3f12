//! Project repository for database operations.
//!
//! Visibility rules: a project is visible to its owning company's members and
//! to users bridged in through an active `project_teams` row. Superadmins see
//! everything.

use chrono::{DateTime, Utc};
use projextpal_core::policy::Context;
use projextpal_shared::HealthColors;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

use crate::entities::{project_teams, projects, sea_orm_active_enums::ProjectStatus};

/// Project repository for scoped reads and the atomic health write.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    db: DatabaseConnection,
}

impl ProjectRepository {
    /// Creates a new project repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists all projects owned by a company, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn projects_for(&self, company_id: i64) -> Result<Vec<projects::Model>, DbErr> {
        projects::Entity::find()
            .filter(projects::Column::CompanyId.eq(company_id))
            .order_by_asc(projects::Column::Id)
            .all(&self.db)
            .await
    }

    /// Lists every project the caller can see: the company's own projects
    /// plus projects the caller was bridged into via an active team row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_visible(&self, ctx: &Context) -> Result<Vec<projects::Model>, DbErr> {
        let Some(company_id) = ctx.company_id else {
            // Superadmin: no tenant filter.
            return projects::Entity::find()
                .order_by_asc(projects::Column::Id)
                .all(&self.db)
                .await;
        };

        let bridged: Vec<i64> = project_teams::Entity::find()
            .select_only()
            .column(project_teams::Column::ProjectId)
            .filter(project_teams::Column::UserId.eq(ctx.user_id))
            .filter(project_teams::Column::IsActive.eq(true))
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut visibility = Condition::any().add(projects::Column::CompanyId.eq(company_id));
        if !bridged.is_empty() {
            visibility = visibility.add(projects::Column::Id.is_in(bridged));
        }

        projects::Entity::find()
            .filter(visibility)
            .order_by_asc(projects::Column::Id)
            .all(&self.db)
            .await
    }

    /// Finds one project if the caller can see it; `None` covers both a
    /// missing row and a row outside the caller's visibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_scoped(
        &self,
        ctx: &Context,
        project_id: i64,
    ) -> Result<Option<projects::Model>, DbErr> {
        let Some(project) = projects::Entity::find_by_id(project_id).one(&self.db).await? else {
            return Ok(None);
        };

        let Some(company_id) = ctx.company_id else {
            return Ok(Some(project));
        };

        if project.company_id == company_id {
            return Ok(Some(project));
        }

        let bridged = project_teams::Entity::find()
            .filter(project_teams::Column::ProjectId.eq(project_id))
            .filter(project_teams::Column::UserId.eq(ctx.user_id))
            .filter(project_teams::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;

        Ok((bridged > 0).then_some(project))
    }

    /// Lists the projects that participate in bulk forecasting
    /// (pending or in-progress). `None` company means all companies.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn active_projects(
        &self,
        company_id: Option<i64>,
    ) -> Result<Vec<projects::Model>, DbErr> {
        let mut query = projects::Entity::find().filter(
            projects::Column::Status
                .is_in([ProjectStatus::Pending, ProjectStatus::InProgress]),
        );
        if let Some(company_id) = company_id {
            query = query.filter(projects::Column::CompanyId.eq(company_id));
        }
        query.order_by_asc(projects::Column::Id).all(&self.db).await
    }

    /// Writes all seven health colors and the analysis timestamp in a single
    /// UPDATE, so readers never observe a half-written color set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn persist_health(
        &self,
        project_id: i64,
        colors: &HealthColors,
        analyzed_at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        projects::Entity::update_many()
            .col_expr(projects::Column::ScopeColor, Expr::value(colors.scope.hex()))
            .col_expr(projects::Column::TimeColor, Expr::value(colors.time.hex()))
            .col_expr(projects::Column::CostColor, Expr::value(colors.cost.hex()))
            .col_expr(
                projects::Column::CashFlowColor,
                Expr::value(colors.cash_flow.hex()),
            )
            .col_expr(
                projects::Column::SafetyColor,
                Expr::value(colors.safety.hex()),
            )
            .col_expr(projects::Column::RiskColor, Expr::value(colors.risk.hex()))
            .col_expr(
                projects::Column::QualityColor,
                Expr::value(colors.quality.hex()),
            )
            .col_expr(
                projects::Column::LastAnalysisDate,
                Expr::value(Some(analyzed_at)),
            )
            .filter(projects::Column::Id.eq(project_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }
}
