//! Blocker prediction heuristics.
//!
//! Five categorized detectors over the project snapshot. All counts are
//! exact; day boundaries are inclusive at both ends.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use projextpal_shared::TimeWindow;

use super::CollectorError;
use super::types::{ProjectSnapshot, TaskRecord, TaskStatus};
use crate::analytics::milestone_progress;

/// Severity of a predicted blocker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Needs attention soon.
    Medium,
    /// Needs attention now.
    High,
}

/// A team member carrying too much open work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverloadedMember {
    /// User ID.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    /// Open (non-done) task count.
    pub active_tasks: u64,
    /// Priority-weighted workload score.
    pub workload_score: u32,
    /// Severity.
    pub severity: Severity,
}

/// An in-progress milestone that stopped moving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalledMilestone {
    /// Milestone ID.
    pub milestone_id: i64,
    /// Milestone name.
    pub name: String,
    /// Computed progress percent.
    pub progress: i32,
    /// Share of tasks updated in the last 7 days, percent.
    pub recently_updated_percent: i32,
    /// Severity.
    pub severity: Severity,
}

/// A high-priority task due imminently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRisk {
    /// Task ID.
    pub task_id: i64,
    /// Assignee user ID.
    pub user_id: i64,
    /// Days until due (0 = due today).
    pub days_until_due: i64,
    /// Severity.
    pub severity: Severity,
}

/// An open high-level risk with no mitigation of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmitigatedRisk {
    /// Risk ID.
    pub risk_id: i64,
    /// Risk title.
    pub title: String,
    /// Severity (always high).
    pub severity: Severity,
}

/// A user with several critical tasks converging in one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConflict {
    /// User ID.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    /// Number of critical tasks.
    pub critical_tasks: u64,
    /// Severity.
    pub severity: Severity,
}

/// Output of the blocker predictor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerPrediction {
    /// Overloaded team members.
    pub overloaded_team_members: Vec<OverloadedMember>,
    /// Stalled milestones.
    pub stalled_milestones: Vec<StalledMilestone>,
    /// Imminent high-priority tasks.
    pub dependency_risks: Vec<DependencyRisk>,
    /// Open high risks without mitigation.
    pub unmitigated_risks: Vec<UnmitigatedRisk>,
    /// Users with converging critical work.
    pub resource_conflicts: Vec<ResourceConflict>,
}

impl BlockerPrediction {
    /// Total blockers across the five categories.
    #[must_use]
    pub fn total_blockers(&self) -> u64 {
        (self.overloaded_team_members.len()
            + self.stalled_milestones.len()
            + self.dependency_risks.len()
            + self.unmitigated_risks.len()
            + self.resource_conflicts.len()) as u64
    }
}

/// Whether `due` falls within `days` calendar days of `today`, not in the
/// past, both ends inclusive.
fn due_within(due: Option<NaiveDate>, today: NaiveDate, days: u64) -> bool {
    due.is_some_and(|d| d >= today && d <= today + Days::new(days))
}

fn is_critical(task: &TaskRecord, today: NaiveDate) -> bool {
    use super::types::TaskPriority::{High, Urgent};
    matches!(task.priority, Urgent | High)
        && matches!(task.status, TaskStatus::Todo | TaskStatus::InProgress)
        && due_within(task.due_date, today, 3)
}

/// Runs the five blocker detectors.
pub fn predict(
    snapshot: &ProjectSnapshot,
    _window: &TimeWindow,
    today: NaiveDate,
) -> Result<BlockerPrediction, CollectorError> {
    // --- Overloaded team members ---------------------------------------
    let mut per_user: BTreeMap<i64, (String, u64, u32)> = BTreeMap::new();
    for task in &snapshot.tasks {
        if task.status == TaskStatus::Done {
            continue;
        }
        if let Some(user_id) = task.assignee_id {
            let entry = per_user
                .entry(user_id)
                .or_insert_with(|| (task.assignee_name.clone().unwrap_or_default(), 0, 0));
            entry.1 += 1;
            entry.2 += task.priority.workload_weight();
        }
    }
    let overloaded: Vec<OverloadedMember> = per_user
        .iter()
        .filter(|(_, (_, active, score))| *active > 5 || *score > 15)
        .map(|(&user_id, (name, active, score))| OverloadedMember {
            user_id,
            name: name.clone(),
            active_tasks: *active,
            workload_score: *score,
            severity: if *score > 20 {
                Severity::High
            } else {
                Severity::Medium
            },
        })
        .collect();

    // --- Stalled milestones --------------------------------------------
    let week_ago = today
        .checked_sub_days(Days::new(7))
        .ok_or_else(|| CollectorError::new("date arithmetic out of range"))?;
    let mut stalled = Vec::new();
    for milestone in &snapshot.milestones {
        if milestone.status != super::types::MilestoneStatus::InProgress {
            continue;
        }
        let tasks: Vec<&TaskRecord> = snapshot
            .tasks
            .iter()
            .filter(|t| t.milestone_id == milestone.id)
            .collect();
        // A milestone with no tasks cannot stall.
        if tasks.is_empty() {
            continue;
        }
        let progress = milestone_progress(&tasks);
        if progress >= 80 {
            continue;
        }
        let recent = tasks
            .iter()
            .filter(|t| t.updated_at.date_naive() >= week_ago)
            .count();
        let recent_pct = (recent * 100 / tasks.len()) as i32;
        if recent_pct > 10 {
            continue;
        }
        stalled.push(StalledMilestone {
            milestone_id: milestone.id,
            name: milestone.name.clone(),
            progress,
            recently_updated_percent: recent_pct,
            severity: if progress < 30 {
                Severity::High
            } else {
                Severity::Medium
            },
        });
    }

    // --- Dependency risks ----------------------------------------------
    let mut dependency_risks = Vec::new();
    for task in &snapshot.tasks {
        use super::types::TaskPriority::{High, Urgent};
        if !matches!(task.priority, Urgent | High) {
            continue;
        }
        if !matches!(task.status, TaskStatus::Todo | TaskStatus::InProgress) {
            continue;
        }
        let Some(user_id) = task.assignee_id else {
            continue;
        };
        if !due_within(task.due_date, today, 2) {
            continue;
        }
        let due = task.due_date.unwrap_or(today);
        let days_until_due = (due - today).num_days();
        dependency_risks.push(DependencyRisk {
            task_id: task.id,
            user_id,
            days_until_due,
            severity: if days_until_due < 1 {
                Severity::High
            } else {
                Severity::Medium
            },
        });
    }

    // --- Unmitigated risks ----------------------------------------------
    let unmitigated: Vec<UnmitigatedRisk> = snapshot
        .risks
        .iter()
        .filter(|r| {
            r.status == super::types::RiskStatus::Open
                && r.level == super::types::RiskLevel::High
                && r.is_unmitigated()
        })
        .map(|r| UnmitigatedRisk {
            risk_id: r.id,
            title: r.title.clone(),
            severity: Severity::High,
        })
        .collect();

    // --- Resource conflicts ----------------------------------------------
    let mut critical_per_user: BTreeMap<i64, (String, u64)> = BTreeMap::new();
    for task in &snapshot.tasks {
        if !is_critical(task, today) {
            continue;
        }
        if let Some(user_id) = task.assignee_id {
            let entry = critical_per_user
                .entry(user_id)
                .or_insert_with(|| (task.assignee_name.clone().unwrap_or_default(), 0));
            entry.1 += 1;
        }
    }
    let conflicts: Vec<ResourceConflict> = critical_per_user
        .into_iter()
        .filter(|(_, (_, count))| *count > 2)
        .map(|(user_id, (name, count))| ResourceConflict {
            user_id,
            name,
            critical_tasks: count,
            severity: if count > 3 {
                Severity::High
            } else {
                Severity::Medium
            },
        })
        .collect();

    Ok(BlockerPrediction {
        overloaded_team_members: overloaded,
        stalled_milestones: stalled,
        dependency_risks,
        unmitigated_risks: unmitigated,
        resource_conflicts: conflicts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{risk, snapshot_with_tasks, task};
    use crate::analytics::types::{
        MilestoneStatus, RiskLevel, RiskStatus, TaskPriority, TaskStatus,
    };
    use projextpal_shared::TimeFilter;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_overload_scenario_six_high_tasks() {
        // Six open high-priority tasks on one user: active=6, score=18,
        // severity medium (high needs score > 20).
        let today = date(2024, 6, 1);
        let mut tasks = Vec::new();
        for id in 1..=6 {
            let mut t = task(id, 1, TaskStatus::Todo, TaskPriority::High, None);
            t.assignee_id = Some(42);
            t.assignee_name = Some("Dana".into());
            tasks.push(t);
        }
        let snapshot = snapshot_with_tasks(tasks);
        let window = TimeFilter::Overall.window(today);

        let result = predict(&snapshot, &window, today).unwrap();
        assert_eq!(result.overloaded_team_members.len(), 1);
        let member = &result.overloaded_team_members[0];
        assert_eq!(member.user_id, 42);
        assert_eq!(member.active_tasks, 6);
        assert_eq!(member.workload_score, 18);
        assert_eq!(member.severity, Severity::Medium);
    }

    #[test]
    fn test_overload_high_severity_above_twenty() {
        let today = date(2024, 6, 1);
        let mut tasks = Vec::new();
        for id in 1..=6 {
            let mut t = task(id, 1, TaskStatus::Todo, TaskPriority::Urgent, None);
            t.assignee_id = Some(1);
            tasks.push(t);
        }
        let snapshot = snapshot_with_tasks(tasks);
        let window = TimeFilter::Overall.window(today);

        let result = predict(&snapshot, &window, today).unwrap();
        assert_eq!(result.overloaded_team_members[0].workload_score, 24);
        assert_eq!(result.overloaded_team_members[0].severity, Severity::High);
    }

    #[test]
    fn test_five_open_low_tasks_is_not_overloaded() {
        let today = date(2024, 6, 1);
        let mut tasks = Vec::new();
        for id in 1..=5 {
            let mut t = task(id, 1, TaskStatus::Todo, TaskPriority::Low, None);
            t.assignee_id = Some(1);
            tasks.push(t);
        }
        let snapshot = snapshot_with_tasks(tasks);
        let window = TimeFilter::Overall.window(today);

        let result = predict(&snapshot, &window, today).unwrap();
        assert!(result.overloaded_team_members.is_empty());
    }

    #[test]
    fn test_stalled_milestone() {
        let today = date(2024, 6, 15);
        let mut tasks = Vec::new();
        for id in 1..=10 {
            let mut t = task(id, 1, TaskStatus::InProgress, TaskPriority::Medium, None);
            t.progress = 20;
            t.updated_at = date(2024, 5, 1).and_hms_opt(0, 0, 0).unwrap().and_utc();
            tasks.push(t);
        }
        // One task touched this week: 10% updated, still within threshold.
        tasks[0].updated_at = date(2024, 6, 14).and_hms_opt(0, 0, 0).unwrap().and_utc();
        let mut snapshot = snapshot_with_tasks(tasks);
        snapshot.milestones[0].status = MilestoneStatus::InProgress;
        let window = TimeFilter::Overall.window(today);

        let result = predict(&snapshot, &window, today).unwrap();
        assert_eq!(result.stalled_milestones.len(), 1);
        let stalled = &result.stalled_milestones[0];
        assert_eq!(stalled.progress, 20);
        assert_eq!(stalled.severity, Severity::High);
    }

    #[test]
    fn test_actively_updated_milestone_is_not_stalled() {
        let today = date(2024, 6, 15);
        let mut tasks = Vec::new();
        for id in 1..=4 {
            let mut t = task(id, 1, TaskStatus::InProgress, TaskPriority::Medium, None);
            t.progress = 50;
            t.updated_at = date(2024, 6, 14).and_hms_opt(0, 0, 0).unwrap().and_utc();
            tasks.push(t);
        }
        let mut snapshot = snapshot_with_tasks(tasks);
        snapshot.milestones[0].status = MilestoneStatus::InProgress;
        let window = TimeFilter::Overall.window(today);

        let result = predict(&snapshot, &window, today).unwrap();
        assert!(result.stalled_milestones.is_empty());
    }

    #[test]
    fn test_dependency_risk_severity_by_due_day() {
        let today = date(2024, 6, 1);
        let mut due_today = task(1, 1, TaskStatus::Todo, TaskPriority::Urgent, Some(today));
        due_today.assignee_id = Some(1);
        let mut due_in_two = task(
            2,
            1,
            TaskStatus::InProgress,
            TaskPriority::High,
            Some(date(2024, 6, 3)),
        );
        due_in_two.assignee_id = Some(2);
        // Unassigned: excluded even though urgent and imminent.
        let unassigned = task(3, 1, TaskStatus::Todo, TaskPriority::Urgent, Some(today));

        let snapshot = snapshot_with_tasks(vec![due_today, due_in_two, unassigned]);
        let window = TimeFilter::Overall.window(today);

        let result = predict(&snapshot, &window, today).unwrap();
        assert_eq!(result.dependency_risks.len(), 2);
        assert_eq!(result.dependency_risks[0].severity, Severity::High);
        assert_eq!(result.dependency_risks[1].severity, Severity::Medium);
    }

    #[test]
    fn test_unmitigated_risk_detection() {
        let today = date(2024, 6, 1);
        let mut snapshot = snapshot_with_tasks(vec![]);
        snapshot.risks = vec![
            risk(1, RiskLevel::High, RiskStatus::Open, false, false),
            risk(2, RiskLevel::High, RiskStatus::Open, true, false),
            risk(3, RiskLevel::Medium, RiskStatus::Open, false, false),
            risk(4, RiskLevel::High, RiskStatus::Closed, false, false),
        ];
        let window = TimeFilter::Overall.window(today);

        let result = predict(&snapshot, &window, today).unwrap();
        assert_eq!(result.unmitigated_risks.len(), 1);
        assert_eq!(result.unmitigated_risks[0].risk_id, 1);
        assert_eq!(result.unmitigated_risks[0].severity, Severity::High);
    }

    #[test]
    fn test_resource_conflict() {
        let today = date(2024, 6, 1);
        let mut tasks = Vec::new();
        for id in 1..=3 {
            let mut t = task(
                id,
                1,
                TaskStatus::Todo,
                TaskPriority::Urgent,
                Some(date(2024, 6, 2)),
            );
            t.assignee_id = Some(9);
            tasks.push(t);
        }
        let snapshot = snapshot_with_tasks(tasks);
        let window = TimeFilter::Overall.window(today);

        let result = predict(&snapshot, &window, today).unwrap();
        assert_eq!(result.resource_conflicts.len(), 1);
        assert_eq!(result.resource_conflicts[0].critical_tasks, 3);
        assert_eq!(result.resource_conflicts[0].severity, Severity::Medium);
    }

    #[test]
    fn test_total_blockers_sums_categories() {
        let today = date(2024, 6, 1);
        let mut t = task(1, 1, TaskStatus::Todo, TaskPriority::Urgent, Some(today));
        t.assignee_id = Some(1);
        let mut snapshot = snapshot_with_tasks(vec![t]);
        snapshot.risks = vec![risk(1, RiskLevel::High, RiskStatus::Open, false, false)];
        let window = TimeFilter::Overall.window(today);

        let result = predict(&snapshot, &window, today).unwrap();
        assert_eq!(result.total_blockers(), 2);
    }
}
