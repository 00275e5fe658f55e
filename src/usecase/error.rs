use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::domain::review::FieldViolation;
use crate::repository::errors::RepositoryError;

#[derive(Debug, Error)]
pub enum UsecaseError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("{0}")]
    Internal(String),
}

impl From<RepositoryError> for UsecaseError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => UsecaseError::NotFound("Resource".to_string()),
            RepositoryError::DatabaseError(msg) => UsecaseError::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for UsecaseError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let violations = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string);
                    FieldViolation::new(field.to_string(), message)
                })
            })
            .collect();
        UsecaseError::Validation(violations)
    }
}

impl IntoResponse for UsecaseError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            UsecaseError::NotFound(_) => StatusCode::NOT_FOUND,
            UsecaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            UsecaseError::Validation(_) => StatusCode::BAD_REQUEST,
            UsecaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            UsecaseError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
            }
            UsecaseError::NotFound(_) => {
                tracing::warn!(error = %self, "resource not found");
            }
            UsecaseError::Forbidden(_) => {
                tracing::warn!(error = %self, "forbidden");
            }
            UsecaseError::Validation(violations) => {
                tracing::debug!(?violations, "validation failed");
            }
        }

        match self {
            UsecaseError::Validation(violations) => (
                status,
                Json(serde_json::json!({ "errors": violations })),
            )
                .into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        let err: UsecaseError = RepositoryError::NotFound.into();
        assert!(matches!(err, UsecaseError::NotFound(_)));
    }

    #[test]
    fn test_repository_database_error_maps_to_internal() {
        let err: UsecaseError = RepositoryError::DatabaseError("boom".to_string()).into();
        assert!(matches!(err, UsecaseError::Internal(msg) if msg == "boom"));
    }
}
