//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid identity.
    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    /// Role insufficient for the requested action.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Caller's company does not own the object and no team bridge exists.
    #[error("Not in tenant: {0}")]
    NotInTenant(String),

    /// Target does not exist or is outside the caller's tenant.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Uniqueness violation (e.g., second active subscription).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A metric collector or forecast source failed.
    #[error("Metric unavailable: {collector}: {message}")]
    MetricUnavailable {
        /// Name of the failing collector.
        collector: &'static str,
        /// Failure detail.
        message: String,
    },

    /// An external dependency (billing) is down and cannot degrade.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::Forbidden(_) | Self::NotInTenant(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::MetricUnavailable { .. } => 503,
            Self::UpstreamUnavailable(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotInTenant(_) => "NOT_IN_TENANT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Conflict(_) => "CONFLICT",
            Self::MetricUnavailable { .. } => "METRIC_UNAVAILABLE",
            Self::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error should hide its message behind a correlation id.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Unauthenticated(String::new()).status_code(), 401);
        assert_eq!(AppError::Forbidden(String::new()).status_code(), 403);
        assert_eq!(AppError::NotInTenant(String::new()).status_code(), 403);
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(AppError::Conflict(String::new()).status_code(), 409);
        assert_eq!(
            AppError::MetricUnavailable {
                collector: "overdue",
                message: String::new()
            }
            .status_code(),
            503
        );
        assert_eq!(
            AppError::UpstreamUnavailable(String::new()).status_code(),
            502
        );
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Unauthenticated(String::new()).error_code(),
            "UNAUTHENTICATED"
        );
        assert_eq!(
            AppError::NotInTenant(String::new()).error_code(),
            "NOT_IN_TENANT"
        );
        assert_eq!(
            AppError::MetricUnavailable {
                collector: "performance",
                message: String::new()
            }
            .error_code(),
            "METRIC_UNAVAILABLE"
        );
        assert_eq!(
            AppError::UpstreamUnavailable(String::new()).error_code(),
            "UPSTREAM_UNAVAILABLE"
        );
    }

    #[test]
    fn test_metric_unavailable_names_collector() {
        let err = AppError::MetricUnavailable {
            collector: "blockers",
            message: "task load failed".into(),
        };
        assert_eq!(
            err.to_string(),
            "Metric unavailable: blockers: task load failed"
        );
    }

    #[test]
    fn test_internal_flag() {
        assert!(AppError::Database(String::new()).is_internal());
        assert!(AppError::Internal(String::new()).is_internal());
        assert!(!AppError::NotFound(String::new()).is_internal());
        assert!(!AppError::UpstreamUnavailable(String::new()).is_internal());
    }
}
