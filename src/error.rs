use crate::lifecycle::MatchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::NotFound { .. } => AppError::NotFound(err.to_string()),
            MatchError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            MatchError::InvalidWinner { .. } | MatchError::DuplicateParty(_) => {
                AppError::BadRequest(err.to_string())
            }
            MatchError::Inconsistent(_) | MatchError::Persistence(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MatchId, MatchStatus};

    fn status_of(err: MatchError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_match_errors_map_to_status_codes() {
        assert_eq!(
            status_of(MatchError::match_not_found(MatchId::new(1))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(MatchError::InvalidTransition {
                id: MatchId::new(1),
                expected: MatchStatus::Pending,
                actual: MatchStatus::Rejected,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(MatchError::InvalidWinner {
                winner: "player#9".into()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(MatchError::DuplicateParty("team#1".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(MatchError::Persistence(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
