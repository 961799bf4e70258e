//! User management API handlers
//!
//! Thin mapping from HTTP onto the [`AccountStore`]: one store call per
//! step, store results translated into status codes.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    Json,
};
use tracing::info;
use validator::Validate;

use super::dto::{CreateUserRequest, EditUserRequest, UserDto};
use crate::domain::{AccountStore, User};
use crate::interfaces::http::common::{ApiError, ErrorResponse, JsonBody, ValidatedJson};

/// User handler state. The store is injected once at startup.
#[derive(Clone)]
pub struct UserHandlerState {
    pub store: Arc<dyn AccountStore>,
}

async fn find_user(state: &UserHandlerState, id: &str) -> Result<User, ApiError> {
    state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(id))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = [UserDto])
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    let users = state.store.users().await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserDto),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let user = find_user(&state, &id).await?;
    Ok(Json(UserDto::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto,
            headers(("Location" = String, description = "URL of the new user"))),
        (status = 400, description = "Validation or store error", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<UserDto>), ApiError> {
    let mut user = User::new(request.user_name);
    user.email = Some(request.email);
    user.phone_number = request.phone_number;

    let result = state.store.create(&mut user, &request.password).await?;
    if !result.succeeded() {
        return Err(result.into());
    }

    let location = format!("/api/users/{}", user.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(UserDto::from(user)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    request_body = EditUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserDto),
        (status = 400, description = "Id mismatch, validation or store error", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<EditUserRequest>,
) -> Result<Json<UserDto>, ApiError> {
    // Checked before validation: a mismatch is rejected whatever the body holds.
    if id != request.id {
        return Err(ApiError::field(
            "id",
            format!("Path id '{}' does not match body id '{}'", id, request.id),
        ));
    }
    request.validate()?;

    let mut user = find_user(&state, &id).await?;
    user.user_name = request.user_name;
    user.phone_number = request.phone_number;

    let result = state.store.set_email(&mut user, Some(request.email)).await?;
    if !result.succeeded() {
        return Err(result.into());
    }

    let result = state.store.update(&mut user).await?;
    if !result.succeeded() {
        return Err(result.into());
    }

    info!(user_id = %user.id, "User edited via API");
    Ok(Json(UserDto::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Store error", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user = find_user(&state, &id).await?;

    let result = state.store.delete(&user).await?;
    if !result.succeeded() {
        return Err(result.into());
    }

    Ok(StatusCode::NO_CONTENT)
}
