//! HTTP error mapping
//!
//! Every failure response has the body `{"errors": [{"field", "message"}]}`
//! with entries in the order they were detected.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::domain::{DomainError, IdentityError, IdentityResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// JSON field name, or the store error code for account store failures
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<IdentityError> for FieldError {
    fn from(e: IdentityError) -> Self {
        Self::new(e.code, e.description)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request ({} errors)", .0.len())]
    BadRequest(Vec<FieldError>),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest(vec![FieldError::new(field, message)])
    }

    pub fn user_not_found(id: &str) -> Self {
        Self::NotFound(format!("User '{}' not found", id))
    }
}

impl From<IdentityResult> for ApiError {
    fn from(result: IdentityResult) -> Self {
        Self::BadRequest(result.into_errors().into_iter().map(FieldError::from).collect())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::BadRequest(validation_field_errors(&errors))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            Self::BadRequest(errors) => (StatusCode::BAD_REQUEST, errors),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                vec![FieldError::new("id", message)],
            ),
            Self::Domain(e) => {
                error!(error = %e, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![FieldError::new("", "Internal server error")],
                )
            }
        };

        (status, Json(ErrorResponse { errors })).into_response()
    }
}

/// Flattens validator output, sorted by field so responses are stable.
pub fn validation_field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = camel_case(&field);
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                FieldError::new(field.clone(), message)
            })
        })
        .collect()
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_follow_json_casing() {
        assert_eq!(camel_case("phone_number"), "phoneNumber");
        assert_eq!(camel_case("userName"), "userName");
        assert_eq!(camel_case("email"), "email");
    }

    #[test]
    fn identity_failure_keeps_store_order() {
        let result = IdentityResult::failed(vec![
            IdentityError::duplicate_user_name("amy"),
            IdentityError::duplicate_email("amy@example.com"),
        ]);

        let ApiError::BadRequest(errors) = ApiError::from(result) else {
            panic!("expected bad request");
        };
        assert_eq!(errors[0].field, "DuplicateUserName");
        assert_eq!(errors[1].message, "Email 'amy@example.com' is already taken.");
    }

    #[test]
    fn unexpected_domain_failures_are_internal_errors() {
        for err in [
            DomainError::Storage("disk gone".into()),
            DomainError::Conflict("Users.NormalizedUserName".into()),
            DomainError::Crypto("bad cost".into()),
        ] {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
