//! Error responses.
//!
//! # Responsibilities
//! - Map collaborator errors to a small response taxonomy
//! - Log dependency faults server-side with full detail
//! - Keep internal error text out of response bodies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ModelError;
use crate::session::StoreError;

/// Failures a handler or middleware can turn into a response.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request body or a field that failed to parse.
    #[error("bad request")]
    ClientInput,

    #[error("not found")]
    NotFound,

    /// A store or other collaborator failed.
    #[error("dependency failure: {0}")]
    Dependency(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ClientInput => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ModelError> for AppError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::NoRecord => AppError::NotFound,
            other => AppError::Dependency(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        AppError::Dependency(error.to_string())
    }
}

impl From<minijinja::Error> for AppError {
    fn from(error: minijinja::Error) -> Self {
        AppError::Dependency(format!("render template: {error:#}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let AppError::Dependency(ref detail) = self {
            tracing::error!(error = %detail, "Server error");
        }
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}
