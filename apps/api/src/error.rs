use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taskflow_core::AppError;
use tracing::error;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DeadlineExceeded(_) => StatusCode::GONE,
            AppError::FailedPrecondition(_) => StatusCode::PRECONDITION_FAILED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            AppError::Internal(detail) => {
                error!(%detail, "request failed with internal error");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };

        let payload = Json(ErrorResponse::new(self.0.code(), message));
        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use taskflow_core::AppError;

    use super::ApiError;

    #[test]
    fn app_errors_map_to_distinct_statuses() {
        let cases = [
            (AppError::Validation(String::new()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized(String::new()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden(String::new()), StatusCode::FORBIDDEN),
            (AppError::NotFound(String::new()), StatusCode::NOT_FOUND),
            (AppError::Conflict(String::new()), StatusCode::CONFLICT),
            (AppError::DeadlineExceeded(String::new()), StatusCode::GONE),
            (
                AppError::FailedPrecondition(String::new()),
                StatusCode::PRECONDITION_FAILED,
            ),
            (
                AppError::Internal(String::new()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError(error).into_response().status(), status);
        }
    }
}
