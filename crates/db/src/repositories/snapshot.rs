//! Snapshot repository: the analyzer's view of the database.
//!
//! Loads everything the metric collectors need for one project in a single
//! pass, then hands the pure core a [`ProjectSnapshot`]. Also the write path
//! for the seven health colors.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use projextpal_core::analytics::types::{
    ChangeRequestRecord, ContextRecords, DeploymentRecord, MilestoneRecord, ProjectInfo,
    ProjectSnapshot, RiskRecord, TaskRecord,
};
use projextpal_core::analytics::{SnapshotError, SnapshotSource};
use projextpal_core::policy::Context;
use projextpal_shared::HealthColors;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use super::{expense, ProjectRepository, TeamRepository};
use crate::entities::{
    activities, change_requests, deployments, documents, expenses, meetings, milestones,
    risk_mitigations, risks, sea_orm_active_enums::MitigationSource, stakeholders, surveys, tasks,
    users,
};

/// Loads project snapshots and persists analysis results.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    db: DatabaseConnection,
    projects: ProjectRepository,
    teams: TeamRepository,
}

impl SnapshotRepository {
    /// Creates a new snapshot repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            projects: ProjectRepository::new(db.clone()),
            teams: TeamRepository::new(db.clone()),
            db,
        }
    }

    async fn load(
        &self,
        ctx: &Context,
        project_id: i64,
    ) -> Result<Option<ProjectSnapshot>, DbErr> {
        let Some(project) = self.projects.find_scoped(ctx, project_id).await? else {
            return Ok(None);
        };

        let milestone_rows = milestones::Entity::find()
            .filter(milestones::Column::ProjectId.eq(project_id))
            .order_by_asc(milestones::Column::OrderIndex)
            .order_by_asc(milestones::Column::Id)
            .all(&self.db)
            .await?;
        let milestone_ids: Vec<i64> = milestone_rows.iter().map(|m| m.id).collect();

        let task_rows = if milestone_ids.is_empty() {
            Vec::new()
        } else {
            tasks::Entity::find()
                .filter(tasks::Column::MilestoneId.is_in(milestone_ids))
                .order_by_asc(tasks::Column::Id)
                .all(&self.db)
                .await?
        };

        let assignee_names = self.assignee_names(&task_rows).await?;

        let risk_rows = risks::Entity::find()
            .filter(risks::Column::ProjectId.eq(project_id))
            .order_by_asc(risks::Column::Id)
            .all(&self.db)
            .await?;
        let mitigations = self.mitigation_sources(&risk_rows).await?;

        let expense_rows = expenses::Entity::find()
            .filter(expenses::Column::ProjectId.eq(project_id))
            .order_by_asc(expenses::Column::ExpenseDate)
            .all(&self.db)
            .await?;

        let context = self.load_context(project_id).await?;
        let team_size = self.teams.team_size(project_id).await?;

        let snapshot = ProjectSnapshot {
            project: ProjectInfo {
                id: project.id,
                name: project.name,
                company_id: project.company_id,
                status: project.status.into(),
                start_date: project.start_date,
                end_date: project.end_date,
                budget: project.budget,
            },
            milestones: milestone_rows
                .into_iter()
                .map(|m| MilestoneRecord {
                    id: m.id,
                    name: m.name,
                    order_index: m.order_index,
                    status: m.status.into(),
                    start_date: m.start_date,
                    end_date: m.end_date,
                })
                .collect(),
            tasks: task_rows
                .into_iter()
                .map(|t| TaskRecord {
                    id: t.id,
                    milestone_id: t.milestone_id,
                    assignee_id: t.assignee_id,
                    assignee_name: t
                        .assignee_id
                        .and_then(|id| assignee_names.get(&id).cloned()),
                    priority: t.priority.into(),
                    status: t.status.into(),
                    progress: t.progress,
                    due_date: t.due_date,
                    updated_at: t.updated_at.with_timezone(&Utc),
                })
                .collect(),
            risks: risk_rows
                .into_iter()
                .map(|r| {
                    let id = r.id;
                    RiskRecord {
                        id,
                        title: r.title,
                        category: r.category,
                        impact: r.impact.into(),
                        probability: r.probability,
                        level: r.level.into(),
                        status: r.status.into(),
                        has_ai_mitigation: mitigations.contains(&(id, MitigationSource::Ai)),
                        has_manual_mitigation: mitigations
                            .contains(&(id, MitigationSource::Manual)),
                    }
                })
                .collect(),
            expenses: expense_rows.into_iter().map(expense::to_record).collect(),
            context,
            team_size,
        };

        Ok(Some(snapshot))
    }

    async fn assignee_names(
        &self,
        task_rows: &[tasks::Model],
    ) -> Result<HashMap<i64, String>, DbErr> {
        let ids: HashSet<i64> = task_rows.iter().filter_map(|t| t.assignee_id).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|u| (u.id, u.name)).collect())
    }

    async fn mitigation_sources(
        &self,
        risk_rows: &[risks::Model],
    ) -> Result<HashSet<(i64, MitigationSource)>, DbErr> {
        let ids: Vec<i64> = risk_rows.iter().map(|r| r.id).collect();
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows = risk_mitigations::Entity::find()
            .filter(risk_mitigations::Column::RiskId.is_in(ids))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| (m.risk_id, m.source)).collect())
    }

    async fn load_context(&self, project_id: i64) -> Result<ContextRecords, DbErr> {
        let stakeholders = stakeholders::Entity::find()
            .filter(stakeholders::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| s.created_at.date_naive())
            .collect();

        let change_requests = change_requests::Entity::find()
            .filter(change_requests::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| ChangeRequestRecord {
                date: c.requested_on,
                stage: c.stage,
            })
            .collect();

        let meetings = meetings::Entity::find()
            .filter(meetings::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.held_on)
            .collect();

        let deployments = deployments::Entity::find()
            .filter(deployments::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|d| DeploymentRecord {
                date: d.deployed_on,
                ready: d.is_ready,
            })
            .collect();

        let surveys = surveys::Entity::find()
            .filter(surveys::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| s.submitted_on)
            .collect();

        let activities = activities::Entity::find()
            .filter(activities::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|a| a.occurred_on)
            .collect();

        let documents = documents::Entity::find()
            .filter(documents::Column::ProjectId.eq(project_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|d| d.uploaded_on)
            .collect();

        Ok(ContextRecords {
            stakeholders,
            change_requests,
            meetings,
            deployments,
            surveys,
            activities,
            documents,
        })
    }
}

#[async_trait]
impl SnapshotSource for SnapshotRepository {
    async fn load_snapshot(
        &self,
        ctx: &Context,
        project_id: i64,
    ) -> Result<Option<ProjectSnapshot>, SnapshotError> {
        self.load(ctx, project_id)
            .await
            .map_err(|e| SnapshotError::Store(e.to_string()))
    }

    async fn persist_health(
        &self,
        project_id: i64,
        colors: &HealthColors,
        analyzed_at: DateTime<Utc>,
    ) -> Result<(), SnapshotError> {
        self.projects
            .persist_health(project_id, colors, analyzed_at)
            .await
            .map_err(|e| SnapshotError::Store(e.to_string()))
    }
}
