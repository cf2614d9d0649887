use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::guest_link_id::GuestLinkId;
use crate::store::StoreError;
use crate::validation::ValidationError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Guest link {0} not found")]
    GuestLinkNotFound(GuestLinkId),

    #[error("Guest link ID collision on {0}")]
    IdCollision(GuestLinkId),

    #[error("Corrupt guest link {id}: {reason}")]
    CorruptRecord { id: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::GuestLinkNotFound(id),
            StoreError::AlreadyExists(id) => AppError::IdCollision(id),
            StoreError::CorruptRecord { id, reason } => AppError::CorruptRecord { id, reason },
            StoreError::Database(e) => AppError::DatabaseError(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Bad request"),
            AppError::GuestLinkNotFound(_) => (StatusCode::NOT_FOUND, "Guest link not found"),
            AppError::IdCollision(_) => {
                tracing::error!("Guest link ID collision: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::CorruptRecord { .. } => {
                tracing::error!("Corrupt record: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error"),
            AppError::DatabaseError(_) => {
                tracing::error!("Database error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
            AppError::ServerError(_) => {
                tracing::error!("Server error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        };

        // Internal details stay in the logs
        let message = if status.is_server_error() {
            error_message.to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> GuestLinkId {
        GuestLinkId::parse("abcdefgh23456789").unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                AppError::Validation(ValidationError::MissingField("fileLifetime")),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Validation(ValidationError::InvalidGuestLinkId("nope".into())),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::GuestLinkNotFound(id()), StatusCode::NOT_FOUND),
            (AppError::IdCollision(id()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::ServerError("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_store_errors_convert() {
        assert!(matches!(
            AppError::from(StoreError::NotFound(id())),
            AppError::GuestLinkNotFound(_)
        ));
        assert!(matches!(
            AppError::from(StoreError::AlreadyExists(id())),
            AppError::IdCollision(_)
        ));
    }
}
