// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    ConfigurationError(String),
    #[error("{0}")]
    ConnectionError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    OperationError(String),
}

impl AppError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        AppError::ConnectionError(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn operation(msg: impl Into<String>) -> Self {
        AppError::OperationError(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigurationError(_)
            | AppError::ConnectionError(_)
            | AppError::OperationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Errors after which the cached store handle should not be trusted again.
    pub fn is_connection(&self) -> bool {
        matches!(self, AppError::ConnectionError(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Error processing request");
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => AppError::ConnectionError(err.to_string()),
            other => AppError::OperationError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::OperationError(format!("Invalid JSON body: {err}"))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::OperationError(format!("Invalid id: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn validation_maps_to_bad_request_with_error_body() {
        let resp = AppError::validation("Missing id").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Missing id" }));
    }

    #[test]
    fn everything_else_is_internal() {
        assert_eq!(AppError::configuration("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::connection("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::operation("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn pool_errors_are_connection_class() {
        assert!(AppError::from(sqlx::Error::PoolTimedOut).is_connection());
        assert!(AppError::from(sqlx::Error::PoolClosed).is_connection());
        assert!(!AppError::from(sqlx::Error::RowNotFound).is_connection());
    }
}
