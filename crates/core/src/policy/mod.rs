//! Access policy: role gating and tenant scoping.
//!
//! Two planes. The action plane maps each action to a minimum role. The
//! object plane requires the caller's company to own the object, unless an
//! active team membership bridges the tenants or the caller is a platform
//! operator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use projextpal_shared::{AppError, Role};

/// Request-scoped caller identity. Materialized once per request and passed
/// explicitly to every downstream component; no ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Authenticated user ID.
    pub user_id: i64,
    /// The user's role.
    pub role: Role,
    /// Owning company. `None` only for superadmin.
    pub company_id: Option<i64>,
}

impl Context {
    /// Creates a context for a tenant-scoped user.
    #[must_use]
    pub const fn new(user_id: i64, role: Role, company_id: i64) -> Self {
        Self {
            user_id,
            role,
            company_id: Some(company_id),
        }
    }

    /// Creates a cross-tenant platform operator context.
    #[must_use]
    pub const fn superadmin(user_id: i64) -> Self {
        Self {
            user_id,
            role: Role::Superadmin,
            company_id: None,
        }
    }
}

/// Actions gated by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read project data (summaries, timelines).
    ReadProject,
    /// Run the analysis orchestrator.
    RunAnalysis,
    /// Read financial forecasts.
    ReadForecast,
    /// Create or update project data.
    WriteProject,
    /// Mutate tasks and subtasks.
    ManageTasks,
    /// Log or submit own time entries.
    LogTime,
    /// Add or remove team members.
    ManageTeam,
    /// Approve or reject submitted time entries.
    ApproveTime,
    /// Checkout, upgrade, or cancel the company subscription.
    ManageSubscription,
    /// Destructive admin operations (project deletion, member removal).
    AdminMaintenance,
}

impl Action {
    /// Minimum role required for this action.
    ///
    /// Read actions require `guest`; writes on project data require `pm`;
    /// destructive admin actions and subscription management require `admin`.
    #[must_use]
    pub const fn minimum_role(self) -> Role {
        match self {
            Self::ReadProject | Self::RunAnalysis | Self::ReadForecast => Role::Guest,
            Self::LogTime => Role::Contributor,
            Self::ApproveTime => Role::Reviewer,
            Self::WriteProject | Self::ManageTasks | Self::ManageTeam => Role::Pm,
            Self::ManageSubscription | Self::AdminMaintenance => Role::Admin,
        }
    }
}

/// Policy failure modes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// No authenticated context.
    #[error("no authenticated context")]
    Unauthenticated,

    /// Role below the action's minimum.
    #[error("role {role} is below the required {required} for this action")]
    Forbidden {
        /// Caller's role.
        role: Role,
        /// Required minimum.
        required: Role,
    },

    /// Company mismatch with no team bridge.
    #[error("object belongs to another company")]
    NotInTenant,
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Unauthenticated => Self::Unauthenticated("no context".into()),
            PolicyError::Forbidden { .. } => Self::Forbidden(err.to_string()),
            PolicyError::NotInTenant => Self::NotInTenant(err.to_string()),
        }
    }
}

/// Checks the action plane: the caller's role must meet the action's
/// minimum. Superadmin bypasses all role checks.
pub fn check_action(ctx: &Context, action: Action) -> Result<(), PolicyError> {
    if ctx.role.is_superadmin() {
        return Ok(());
    }
    let required = action.minimum_role();
    if ctx.role.at_least(required) {
        Ok(())
    } else {
        Err(PolicyError::Forbidden {
            role: ctx.role,
            required,
        })
    }
}

/// Checks the object plane: the caller's company must own the object, unless
/// an active team membership bridges the tenants (`team_bridge`) or the
/// caller is superadmin.
pub fn check_object(
    ctx: &Context,
    owning_company: i64,
    team_bridge: bool,
) -> Result<(), PolicyError> {
    if ctx.role.is_superadmin() {
        return Ok(());
    }
    match ctx.company_id {
        Some(company) if company == owning_company => Ok(()),
        Some(_) | None if team_bridge => Ok(()),
        _ => Err(PolicyError::NotInTenant),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Role::Guest, Action::ReadProject, true)]
    #[case(Role::Guest, Action::RunAnalysis, true)]
    #[case(Role::Guest, Action::WriteProject, false)]
    #[case(Role::Guest, Action::LogTime, false)]
    #[case(Role::Contributor, Action::LogTime, true)]
    #[case(Role::Contributor, Action::ManageTasks, false)]
    #[case(Role::Reviewer, Action::ApproveTime, true)]
    #[case(Role::Pm, Action::WriteProject, true)]
    #[case(Role::Pm, Action::ManageSubscription, false)]
    #[case(Role::Admin, Action::ManageSubscription, true)]
    #[case(Role::Admin, Action::AdminMaintenance, true)]
    fn test_action_plane(#[case] role: Role, #[case] action: Action, #[case] allowed: bool) {
        let ctx = Context::new(1, role, 10);
        assert_eq!(check_action(&ctx, action).is_ok(), allowed);
    }

    #[test]
    fn test_superadmin_bypasses_role_checks() {
        let ctx = Context::superadmin(1);
        assert!(check_action(&ctx, Action::AdminMaintenance).is_ok());
        assert!(check_object(&ctx, 99, false).is_ok());
    }

    #[test]
    fn test_same_company_passes_object_plane() {
        let ctx = Context::new(1, Role::Guest, 10);
        assert!(check_object(&ctx, 10, false).is_ok());
    }

    #[test]
    fn test_cross_company_without_bridge_fails() {
        let ctx = Context::new(1, Role::Admin, 10);
        assert_eq!(
            check_object(&ctx, 11, false),
            Err(PolicyError::NotInTenant)
        );
    }

    #[test]
    fn test_team_bridge_allows_cross_company() {
        // Freelancer from company B on a company A project team.
        let ctx = Context::new(1, Role::Contributor, 10);
        assert!(check_object(&ctx, 11, true).is_ok());
    }

    #[test]
    fn test_forbidden_names_required_role() {
        let ctx = Context::new(1, Role::Guest, 10);
        let err = check_action(&ctx, Action::ManageSubscription).unwrap_err();
        assert_eq!(
            err,
            PolicyError::Forbidden {
                role: Role::Guest,
                required: Role::Admin
            }
        );
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 403);
    }
}
