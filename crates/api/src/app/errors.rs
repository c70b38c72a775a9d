use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use stockwatch_auth::ProfilePolicyError;
use stockwatch_infra::RepositoryError;

use crate::app::services::ServiceError;

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    BadRequest(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, msg),
            ApiError::Service(err) => service_error_to_response(err),
        }
    }
}

pub fn service_error_to_response(err: ServiceError) -> Response {
    let status = match &err {
        ServiceError::Policy(p) => match p {
            ProfilePolicyError::Forbidden => StatusCode::FORBIDDEN,
            ProfilePolicyError::NotFound => StatusCode::NOT_FOUND,
            ProfilePolicyError::InvalidOperation
            | ProfilePolicyError::InvariantViolation
            | ProfilePolicyError::Validation(_) => StatusCode::BAD_REQUEST,
        },
        ServiceError::Validation(_) | ServiceError::AdminExists => StatusCode::BAD_REQUEST,
        ServiceError::Repository(RepositoryError::Conflict(_)) => StatusCode::BAD_REQUEST,
        ServiceError::Repository(RepositoryError::LastSuperAdmin) => StatusCode::BAD_REQUEST,
        ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ServiceError::AdminNotFound | ServiceError::StockNotFound => StatusCode::NOT_FOUND,
        ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Credential(_)
        | ServiceError::Repository(RepositoryError::Unavailable(_))
        | ServiceError::Join(_) => {
            tracing::error!(error = %err, "request failed");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };
    json_error(status, err.to_string())
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "message": message.into(),
        })),
    )
        .into_response()
}
