//! Overdue task analysis.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use projextpal_shared::TimeWindow;

use super::CollectorError;
use super::types::{MilestoneRecord, ProjectSnapshot, TaskRecord};

/// Overdue count for one milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneOverdue {
    /// Milestone ID.
    pub milestone_id: i64,
    /// Milestone name.
    pub milestone_name: String,
    /// Overdue task count.
    pub count: u64,
}

/// Overdue count for one assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeOverdue {
    /// Assignee user ID.
    pub user_id: i64,
    /// Assignee display name.
    pub name: String,
    /// Overdue task count.
    pub count: u64,
}

/// Output of the overdue collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueAnalysis {
    /// Total overdue tasks in the window.
    pub total_overdue: u64,
    /// Per-milestone breakdown, ordered by milestone id.
    pub by_milestone: Vec<MilestoneOverdue>,
    /// Per-priority counts keyed by priority name.
    pub by_priority: BTreeMap<String, u64>,
    /// Top 5 assignees, descending by count, ties broken by earliest user id.
    pub by_assignee: Vec<AssigneeOverdue>,
    /// Arithmetic mean of days overdue, 1 decimal.
    pub average_overdue_days: Decimal,
    /// Milestone with the most overdue tasks; ties broken by earliest id.
    pub most_affected_milestone: Option<MilestoneOverdue>,
}

/// Whether a task is in the overdue set for `window` as of `today`.
///
/// Overdue means due before today with an open status. When the window is
/// bounded, the task must additionally have been touched inside the window:
/// `updated_at` on/after the window start OR the due date on/after it.
fn is_overdue(task: &TaskRecord, window: &TimeWindow, today: NaiveDate) -> bool {
    let Some(due) = task.due_date else {
        return false;
    };
    if due >= today || !task.status.is_open() {
        return false;
    }
    match window.start {
        None => true,
        Some(start) => task.updated_at.date_naive() >= start || due >= start,
    }
}

/// Runs the overdue analysis over a snapshot.
pub fn analyze(
    snapshot: &ProjectSnapshot,
    window: &TimeWindow,
    today: NaiveDate,
) -> Result<OverdueAnalysis, CollectorError> {
    let overdue: Vec<&TaskRecord> = snapshot
        .tasks
        .iter()
        .filter(|t| is_overdue(t, window, today))
        .collect();

    let total = overdue.len() as u64;

    // Per-milestone counts, keyed by id for deterministic tie-breaking.
    let mut milestone_counts: BTreeMap<i64, u64> = BTreeMap::new();
    for task in &overdue {
        *milestone_counts.entry(task.milestone_id).or_default() += 1;
    }
    let name_of = |id: i64| -> String {
        snapshot
            .milestones
            .iter()
            .find(|m| m.id == id)
            .map_or_else(String::new, |m: &MilestoneRecord| m.name.clone())
    };
    let by_milestone: Vec<MilestoneOverdue> = milestone_counts
        .iter()
        .map(|(&id, &count)| MilestoneOverdue {
            milestone_id: id,
            milestone_name: name_of(id),
            count,
        })
        .collect();

    // BTreeMap iteration is id-ascending, so max_by_key keeps the earliest
    // id on ties (strictly-greater comparison).
    let most_affected = by_milestone
        .iter()
        .fold(None::<MilestoneOverdue>, |best, m| match best {
            Some(b) if b.count >= m.count => Some(b),
            _ => Some(m.clone()),
        });

    let mut by_priority: BTreeMap<String, u64> = BTreeMap::new();
    for task in &overdue {
        *by_priority
            .entry(task.priority.as_str().to_string())
            .or_default() += 1;
    }

    let mut assignee_counts: BTreeMap<i64, (String, u64)> = BTreeMap::new();
    for task in &overdue {
        if let Some(user_id) = task.assignee_id {
            let entry = assignee_counts
                .entry(user_id)
                .or_insert_with(|| (task.assignee_name.clone().unwrap_or_default(), 0));
            entry.1 += 1;
        }
    }
    let mut by_assignee: Vec<AssigneeOverdue> = assignee_counts
        .into_iter()
        .map(|(user_id, (name, count))| AssigneeOverdue {
            user_id,
            name,
            count,
        })
        .collect();
    // Descending by count; stable sort preserves ascending-id order on ties.
    by_assignee.sort_by(|a, b| b.count.cmp(&a.count));
    by_assignee.truncate(5);

    let average_overdue_days = if overdue.is_empty() {
        Decimal::ZERO
    } else {
        let total_days: i64 = overdue
            .iter()
            .filter_map(|t| t.due_date)
            .map(|due| (today - due).num_days())
            .sum();
        (Decimal::from(total_days) / Decimal::from(overdue.len())).round_dp(1)
    };

    Ok(OverdueAnalysis {
        total_overdue: total,
        by_milestone,
        by_priority,
        by_assignee,
        average_overdue_days,
        most_affected_milestone: most_affected,
    })
}
