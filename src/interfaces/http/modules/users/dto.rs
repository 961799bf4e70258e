//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::domain::User;

/// User API representation. Credentials and stamps are never exposed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub user_name: String,
    pub email: Option<String>,
    pub email_confirmed: bool,
    pub phone_number: Option<String>,
    pub phone_number_confirmed: bool,
    pub two_factor_enabled: bool,
    pub lockout_enabled: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub access_failed_count: i32,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            user_name: u.user_name,
            email: u.email,
            email_confirmed: u.email_confirmed,
            phone_number: u.phone_number,
            phone_number_confirmed: u.phone_number_confirmed,
            two_factor_enabled: u.two_factor_enabled,
            lockout_enabled: u.lockout_enabled,
            lockout_end: u.lockout_end,
            access_failed_count: u.access_failed_count,
        }
    }
}

/// Create user request
///
/// Missing fields deserialize as empty so they are reported by validation
/// alongside every other problem.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 256, message = "The UserName field is required."))]
    pub user_name: String,
    #[validate(
        length(min = 1, max = 256, message = "The Email field is required."),
        email(message = "The Email field is not a valid e-mail address.")
    )]
    pub email: String,
    #[validate(length(max = 64, message = "The PhoneNumber field is too long."))]
    pub phone_number: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "The Password field is required."),
        custom(function = "within_bcrypt_limit")
    )]
    pub password: String,
}

/// Edit user request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EditUserRequest {
    #[validate(length(min = 1, message = "The Id field is required."))]
    pub id: String,
    #[validate(length(min = 1, max = 256, message = "The UserName field is required."))]
    pub user_name: String,
    #[validate(
        length(min = 1, max = 256, message = "The Email field is required."),
        email(message = "The Email field is not a valid e-mail address.")
    )]
    pub email: String,
    #[validate(length(max = 64, message = "The PhoneNumber field is too long."))]
    pub phone_number: Option<String>,
}

/// bcrypt only reads the first 72 bytes of its input.
const BCRYPT_MAX_PASSWORD_BYTES: usize = 72;

fn within_bcrypt_limit(password: &str) -> Result<(), ValidationError> {
    if password.len() <= BCRYPT_MAX_PASSWORD_BYTES {
        return Ok(());
    }
    let mut err = ValidationError::new("password_too_long");
    err.message = Some(
        format!(
            "The Password field must be at most {} bytes.",
            BCRYPT_MAX_PASSWORD_BYTES
        )
        .into(),
    );
    Err(err)
}
