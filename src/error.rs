use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::access::DenialReason;
use crate::location::LocationError;
use crate::token::JoinError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Malformed location string: {0}")]
    MalformedLocation(String),

    #[error("Unrecognized location extension: {0}")]
    UnrecognizedExtension(String),

    #[error("Access denied")]
    AccessDenied(DenialReason),

    #[error("Relationship lookup failed")]
    RelationshipLookupFailed,

    #[error("World unavailable")]
    WorldUnavailable,

    #[error("Token signing failed")]
    SigningFailure,

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Redis error: {0}")]
    RedisError(String),

    #[error("JWT error: {0}")]
    JwtError(String),
}

impl AppError {
    /// Machine-readable reason code included in every error body.
    fn reason(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::BadRequest(_) => "bad_request",
            AppError::MalformedLocation(_) => "malformed_location_string",
            AppError::UnrecognizedExtension(_) => "unrecognized_extension",
            AppError::AccessDenied(reason) => reason.as_str(),
            AppError::RelationshipLookupFailed => "relationship_lookup_failed",
            AppError::WorldUnavailable => "world_unavailable",
            AppError::SigningFailure => "internal_error",
            AppError::InternalError(_) => "internal_error",
            AppError::RedisError(_) => "internal_error",
            AppError::JwtError(_) => "unauthorized",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 5xx-class failures get a generic message; internals stay in logs.
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MalformedLocation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UnrecognizedExtension(key) => (
                StatusCode::BAD_REQUEST,
                format!("Unrecognized location extension: {}", key),
            ),
            AppError::AccessDenied(_) => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            AppError::RelationshipLookupFailed => {
                (StatusCode::FORBIDDEN, "Access denied".to_string())
            }
            AppError::WorldUnavailable => (
                StatusCode::BAD_GATEWAY,
                "World is currently unavailable".to_string(),
            ),
            AppError::SigningFailure => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            AppError::RedisError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            AppError::JwtError(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": error_message,
            "reason": self.reason(),
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<LocationError> for AppError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::Malformed(msg) => AppError::MalformedLocation(msg),
            LocationError::UnrecognizedExtension(key) => AppError::UnrecognizedExtension(key),
        }
    }
}

impl From<JoinError> for AppError {
    fn from(err: JoinError) -> Self {
        match err {
            JoinError::AccessDenied(reason) => AppError::AccessDenied(reason),
            JoinError::WorldUnavailable => AppError::WorldUnavailable,
            JoinError::SigningFailure(e) => {
                tracing::error!(error = %e, "Join token signing failed");
                AppError::SigningFailure
            }
            JoinError::RelationshipLookupFailed(msg) => {
                tracing::warn!(error = %msg, "Relationship lookup failed, denying access");
                AppError::RelationshipLookupFailed
            }
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::RedisError(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for AppError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        AppError::RedisError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::JwtError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
