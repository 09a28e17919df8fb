// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LoginRequest, RegisterRequest, Role, User, UserResponse},
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new account.
///
/// Faculty (ADMIN) registration requires the campus verification code.
/// Passwords are hashed with Argon2 before storage; the store rejects a
/// taken username or email with 409.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.role == Role::Admin
        && payload.faculty_code.as_deref() != Some(state.config.faculty_code.as_str())
    {
        return Err(AppError::AuthError(
            "Invalid faculty verification code".to_string(),
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        username: payload.username,
        name: payload.name,
        email: payload.email,
        role: payload.role,
        password: hash_password(&payload.password)?,
        created_at: Utc::now(),
    };

    state.store.create_user(&user).await.map_err(|e| {
        if !matches!(e, AppError::Conflict(_)) {
            tracing::error!("Failed to register user: {}", e);
        }
        e
    })?;

    let token = sign_jwt(
        user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "type": "Bearer",
            "user": UserResponse::from(&user),
        })),
    ))
}

/// Authenticates by username or email and returns a JWT token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = state
        .store
        .find_user(&payload.identifier)
        .await?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": UserResponse::from(&user),
    })))
}
