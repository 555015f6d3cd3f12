//! API error responses in the `{error, message}` JSON shape.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use projextpal_shared::AppError;

/// Wrapper turning [`AppError`] into an HTTP response.
///
/// 4xx errors pass their message through. 5xx errors replace the message
/// with a correlation id and log the original.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_internal() {
            let correlation_id = uuid::Uuid::new_v4();
            error!(%correlation_id, error = %self.0, "internal error");
            format!("An internal error occurred (ref: {correlation_id})")
        } else {
            self.0.to_string()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

/// Maps a `SeaORM` error into the application database error.
pub fn db_err(err: sea_orm::DbErr) -> ApiError {
    ApiError(AppError::Database(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_passes_message_through() {
        let response = ApiError(AppError::NotFound("project 9".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_hides_message() {
        let response = ApiError(AppError::Database("secret detail".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_metric_unavailable_is_503() {
        let response = ApiError(AppError::MetricUnavailable {
            collector: "overdue",
            message: "load failed".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
