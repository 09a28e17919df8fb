// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::Ordering;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{quiz::QuizDraft, user::UserResponse},
    state::AppState,
    utils::jwt::Claims,
};

/// Creates a quiz from a draft.
/// Admin only. The draft is rejected unless complete (see `QuizDraft`).
pub async fn create_quiz(
    State(state): State<AppState>,
    Json(draft): Json<QuizDraft>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = draft.build(None)?;

    state.store.upsert_quiz(&quiz).await.map_err(|e| {
        tracing::error!("Failed to create quiz: {}", e);
        e
    })?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Replaces a quiz with a new draft, keeping its id stable.
/// Admin only.
pub async fn update_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<QuizDraft>,
) -> Result<impl IntoResponse, AppError> {
    let existing = state
        .store
        .get_quiz(id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let quiz = draft.build(Some(&existing))?;

    state.store.upsert_quiz(&quiz).await.map_err(|e| {
        tracing::error!("Failed to update quiz: {}", e);
        e
    })?;

    Ok(Json(quiz))
}

/// Deletes a quiz by ID.
/// Admin only.
pub async fn delete_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.store.delete_quiz(id).await?;

    if !deleted {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists all accounts, without password hashes.
/// Admin only.
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.store.list_users().await?;
    let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();

    Ok(Json(users))
}

/// Deletes a user by ID.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if claims.user_id()? == id {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let deleted = state.store.delete_user(id).await.map_err(|e| {
        tracing::error!("Failed to delete user: {}", e);
        e
    })?;

    if !deleted {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AssistantToggleRequest {
    pub enabled: bool,
}

/// Current state of the assistant kill switch.
/// Admin only.
pub async fn assistant_status(State(state): State<AppState>) -> impl IntoResponse {
    let enabled = state.assistant_enabled.load(Ordering::Relaxed);
    Json(json!({ "enabled": enabled }))
}

/// Flips the assistant kill switch.
/// Admin only.
pub async fn set_assistant(
    State(state): State<AppState>,
    Json(payload): Json<AssistantToggleRequest>,
) -> impl IntoResponse {
    state
        .assistant_enabled
        .store(payload.enabled, Ordering::Relaxed);
    tracing::info!("Assistant toggled: enabled={}", payload.enabled);

    Json(json!({ "enabled": payload.enabled }))
}
