#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cache::CacheError;
use crate::searcher::SearchError;
use crate::solution::SolveError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No valid solution: {0}")]
    NoValidSolution(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Not implemented")]
    NotImplemented,
}

impl From<SolveError> for AppError {
    fn from(err: SolveError) -> Self {
        match err {
            SolveError::InvalidLocation(location) => {
                AppError::InvalidInput(format!("invalid request location: {location}"))
            }
            SolveError::NoValidSolution => AppError::NoValidSolution(
                "No valid solution is found. Please try to search with a larger radius."
                    .to_string(),
            ),
            SolveError::Search(err) => AppError::Search(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::NoValidSolution(msg) => {
                (StatusCode::BAD_REQUEST, "NO_VALID_SOLUTION", msg.clone())
            }
            AppError::Cache(e) => {
                tracing::error!("Cache error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CACHE_ERROR",
                    "A cache error occurred".to_string(),
                )
            }
            AppError::Search(e) => {
                tracing::error!("Search error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SEARCH_ERROR",
                    "A place search error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::NotImplemented => (
                StatusCode::NOT_IMPLEMENTED,
                "NOT_IMPLEMENTED",
                "This endpoint is delegated to the user component".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
