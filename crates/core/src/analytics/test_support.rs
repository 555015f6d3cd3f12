//! Builders shared by the collector tests.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::{
    ContextRecords, ExpenseRecord, ExpenseStatus, MilestoneRecord, MilestoneStatus, ProjectInfo,
    ProjectSnapshot, ProjectStatus, RiskLevel, RiskRecord, RiskStatus, TaskPriority, TaskRecord,
    TaskStatus,
};

pub(crate) fn task(
    id: i64,
    milestone_id: i64,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<NaiveDate>,
) -> TaskRecord {
    TaskRecord {
        id,
        milestone_id,
        assignee_id: None,
        assignee_name: None,
        priority,
        status,
        progress: 0,
        due_date,
        updated_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc(),
    }
}

/// Snapshot with one milestone per distinct `milestone_id` found in `tasks`,
/// ordered by id so tests can index `snapshot.milestones` predictably.
pub(crate) fn snapshot_with_tasks(tasks: Vec<TaskRecord>) -> ProjectSnapshot {
    let mut ids: Vec<i64> = tasks.iter().map(|t| t.milestone_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let milestones = ids
        .into_iter()
        .enumerate()
        .map(|(i, id)| MilestoneRecord {
            id,
            name: format!("Milestone {id}"),
            order_index: i as i32,
            status: MilestoneStatus::Pending,
            start_date: None,
            end_date: None,
        })
        .collect();

    ProjectSnapshot {
        project: ProjectInfo {
            id: 1,
            name: "Test Project".into(),
            company_id: 1,
            status: ProjectStatus::InProgress,
            start_date: None,
            end_date: None,
            budget: dec!(1000),
        },
        milestones,
        tasks,
        risks: Vec::new(),
        expenses: Vec::new(),
        context: ContextRecords::default(),
        team_size: 0,
    }
}

pub(crate) fn risk(
    id: i64,
    level: RiskLevel,
    status: RiskStatus,
    has_ai_mitigation: bool,
    has_manual_mitigation: bool,
) -> RiskRecord {
    RiskRecord {
        id,
        title: format!("Risk {id}"),
        category: "technical".into(),
        impact: level,
        probability: 50,
        level,
        status,
        has_ai_mitigation,
        has_manual_mitigation,
    }
}

pub(crate) fn expense(id: i64, amount: Decimal, date: NaiveDate) -> ExpenseRecord {
    ExpenseRecord {
        id,
        amount,
        date,
        category: "general".into(),
        status: ExpenseStatus::Approved,
    }
}
