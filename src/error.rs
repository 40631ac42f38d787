use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::quote::QuoteError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid filter value: {0}")]
    InvalidFilter(String),

    #[error("Stock {0} not found")]
    StockNotFound(i32),

    #[error("Quote error: {0}")]
    Quote(#[from] QuoteError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidFilter(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::StockNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Quote(_) => (StatusCode::BAD_GATEWAY, "Quote provider error".to_string()),
            AppError::Template(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Template error".to_string()),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
