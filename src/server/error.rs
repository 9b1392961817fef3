use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::AppError;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Upstream and internal failures are
    /// reduced to a generic description; the detail only goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Config(msg) => msg.clone(),
            AppError::NotFound(_) => self.to_string(),
            AppError::Gateway(_) | AppError::Http(_) => "Failed to reach the gateway".to_string(),
            AppError::Speech(_) => "Speech service request failed".to_string(),
            AppError::GitHub(_) => "GitHub request failed".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::Validation("title is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("Todo").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Gateway("503".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Config("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_detail_is_not_exposed() {
        let err = AppError::Gateway("401: bad token abc123".into());
        assert!(!err.public_message().contains("abc123"));
        assert_eq!(AppError::NotFound("Todo").public_message(), "Todo not found");
    }
}
