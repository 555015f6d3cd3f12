//! User roles and the role hierarchy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User role within a company.
///
/// Roles form a strict order; a role satisfies any requirement at or below
/// its own level. `Superadmin` is cross-tenant and reserved for platform
/// operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access to project data.
    Guest,
    /// Works on assigned tasks.
    Contributor,
    /// Reviews submitted work (e.g., time entries).
    Reviewer,
    /// Project manager; writes project data.
    Pm,
    /// Company administrator; destructive operations and billing.
    Admin,
    /// Platform operator; bypasses tenant scoping.
    Superadmin,
}

impl Role {
    /// Whether this role meets or exceeds `minimum`.
    #[must_use]
    pub fn at_least(self, minimum: Self) -> bool {
        self >= minimum
    }

    /// Whether this role is the cross-tenant platform operator.
    #[must_use]
    pub const fn is_superadmin(self) -> bool {
        matches!(self, Self::Superadmin)
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Contributor => "contributor",
            Self::Reviewer => "reviewer",
            Self::Pm => "pm",
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError(pub String);

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Self::Guest),
            "contributor" => Ok(Self::Contributor),
            "reviewer" => Ok(Self::Reviewer),
            "pm" => Ok(Self::Pm),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Guest < Role::Contributor);
        assert!(Role::Contributor < Role::Reviewer);
        assert!(Role::Reviewer < Role::Pm);
        assert!(Role::Pm < Role::Admin);
        assert!(Role::Admin < Role::Superadmin);
    }

    #[rstest]
    #[case(Role::Pm, Role::Pm, true)]
    #[case(Role::Admin, Role::Pm, true)]
    #[case(Role::Reviewer, Role::Pm, false)]
    #[case(Role::Superadmin, Role::Admin, true)]
    fn test_at_least(#[case] role: Role, #[case] min: Role, #[case] expected: bool) {
        assert_eq!(role.at_least(min), expected);
    }

    #[test]
    fn test_round_trip_names() {
        for role in [
            Role::Guest,
            Role::Contributor,
            Role::Reviewer,
            Role::Pm,
            Role::Admin,
            Role::Superadmin,
        ] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role() {
        assert!("owner".parse::<Role>().is_err());
    }
}
