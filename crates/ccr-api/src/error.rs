//! HTTP error handling
//!
//! Maps `PortalError` onto status codes and JSON error bodies. Validation
//! failures are normally caught by the handler and re-rendered as a form
//! page; the `Validation` variant only reaches the client when a handler has
//! no form to show.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use ccr_auth::SessionError;
use ccr_core::error::{PortalError, ValidationErrors};
use serde::Serialize;

/// Shown instead of the details of database, storage and internal errors
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again later.";

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(ValidationErrors),
    /// No valid session; carries the path to return to after logging in
    LoginRequired { next: String },
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn login_required(next: impl Into<String>) -> Self {
        ApiError::LoginRequired { next: next.into() }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::LoginRequired { .. } => StatusCode::SEE_OTHER,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortalError::Validation(errors) => ApiError::Validation(errors),
            PortalError::Unauthenticated => ApiError::login_required("/dashboard/"),
            PortalError::Forbidden { message } => ApiError::Forbidden(message),
            PortalError::Conflict { message } => ApiError::Conflict(message),
            PortalError::Database(_)
            | PortalError::Storage(_)
            | PortalError::Internal(_)
            | PortalError::Config(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Internal(format!("Session store: {}", err))
    }
}

/// Separate a validation failure, which re-renders the form, from every other error
pub fn into_validation(err: PortalError) -> Result<ValidationErrors, ApiError> {
    match err {
        PortalError::Validation(errors) => Ok(errors),
        other => Err(other.into()),
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<ValidationErrors>,
}

/// Login URL that returns to `next` afterwards
pub fn login_url(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/login/?next={}", encoded)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            ApiError::LoginRequired { next } => {
                return (status, [(header::LOCATION, login_url(&next))]).into_response();
            }
            ApiError::NotFound(message) => ErrorBody {
                error: "not_found",
                message,
                errors: None,
            },
            ApiError::Validation(errors) => ErrorBody {
                error: "validation_failed",
                message: errors.full_messages().join(", "),
                errors: Some(errors),
            },
            ApiError::Forbidden(message) => ErrorBody {
                error: "forbidden",
                message,
                errors: None,
            },
            ApiError::BadRequest(message) => ErrorBody {
                error: "bad_request",
                message,
                errors: None,
            },
            ApiError::Conflict(message) => ErrorBody {
                error: "conflict",
                message,
                errors: None,
            },
            ApiError::Internal(details) => {
                tracing::error!(error = %details, "Request failed");
                ErrorBody {
                    error: "internal_error",
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                    errors: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ccr_models::Project;

    #[test]
    fn test_portal_error_mapping() {
        let err: ApiError = PortalError::not_found::<Project>(3).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = PortalError::forbidden("nope").into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err: ApiError = PortalError::Database("connection reset".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_login_redirect_keeps_next() {
        let response = ApiError::login_required("/client/inbox/?page=2").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/login/?next=%2Fclient%2Finbox%2F%3Fpage%3D2"
        );
    }

    #[test]
    fn test_into_validation() {
        let errors = into_validation(PortalError::invalid("title", "can't be blank")).unwrap();
        assert!(errors.has_error("title"));
        assert!(into_validation(PortalError::forbidden("nope")).is_err());
    }
}
