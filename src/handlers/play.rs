// src/handlers/play.rs

//! HTTP surface of the quiz-taking state machine.
//!
//! Every handler follows the same shape: look the session up, replay
//! elapsed wall-clock time into it, apply the action, and if the machine
//! has reached `Submitted`, persist the attempt and drop the session.
//! When persisting fails the session is kept so the client can retry the
//! save; the attempt itself is never rebuilt.

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::attempt::QuizAttempt,
    session::PlaySession,
    state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub option: usize,
}

/// Starts a play session for the quiz and returns the first view.
///
/// A quiz with no questions or no time budget submits immediately; the
/// returned view then already carries the trivial attempt.
pub async fn start(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .store
        .get_quiz(quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let student_id = claims.user_id()?;
    let session = PlaySession::new(quiz, student_id);
    let token = session.token();
    let view = session.view();
    let finished = session.player().attempt().cloned();

    state.sessions.write().await.insert(token, session);

    if let Some(attempt) = finished {
        persist_and_close(&state, token, &attempt).await?;
    }

    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the current view of a session, honoring elapsed time.
pub async fn view(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (view, submitted) = {
        let mut sessions = state.sessions.write().await;
        let session = lookup(&mut sessions, token, &claims)?;
        session.sync();
        (session.view(), session.player().attempt().cloned())
    };

    if let Some(attempt) = submitted {
        persist_and_close(&state, token, &attempt).await?;
    }

    Ok(Json(view))
}

/// Locks in an option for the current question and reveals feedback.
///
/// If the budget ran out in the meantime the selection is ignored and
/// the response carries the forced submission instead.
pub async fn answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(token): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (view, submitted) = {
        let mut sessions = state.sessions.write().await;
        let session = lookup(&mut sessions, token, &claims)?;
        session.sync();

        if !session.player().is_finished() {
            session
                .player_mut()
                .select_option(payload.option)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
        }

        (session.view(), session.player().attempt().cloned())
    };

    if let Some(attempt) = submitted {
        persist_and_close(&state, token, &attempt).await?;
    }

    Ok(Json(view))
}

/// Moves past the displayed feedback to the next question.
pub async fn next(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (view, submitted) = {
        let mut sessions = state.sessions.write().await;
        let session = lookup(&mut sessions, token, &claims)?;
        session.sync();

        if !session.player().is_finished() {
            session
                .player_mut()
                .advance()
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
        }

        (session.view(), session.player().attempt().cloned())
    };

    if let Some(attempt) = submitted {
        persist_and_close(&state, token, &attempt).await?;
    }

    Ok(Json(view))
}

/// Submits after the final question and persists the attempt.
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(token): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (view, attempt) = {
        let mut sessions = state.sessions.write().await;
        let session = lookup(&mut sessions, token, &claims)?;
        session.sync();

        if !session.player().is_finished() {
            session
                .player_mut()
                .submit()
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
        }

        let attempt = session.player().attempt().cloned().ok_or_else(|| {
            AppError::InternalServerError("Attempt missing after submission".to_string())
        })?;

        (session.view(), attempt)
    };

    persist_and_close(&state, token, &attempt).await?;

    Ok(Json(view))
}

/// A session is only visible to the student who started it; anyone else
/// sees the same 404 as a dropped token.
fn lookup<'a>(
    sessions: &'a mut std::collections::HashMap<Uuid, PlaySession>,
    token: Uuid,
    claims: &Claims,
) -> Result<&'a mut PlaySession, AppError> {
    let student_id = claims.user_id()?;
    let session = sessions
        .get_mut(&token)
        .ok_or(AppError::NotFound("Play session not found".to_string()))?;

    if session.student_id() != student_id {
        return Err(AppError::NotFound("Play session not found".to_string()));
    }

    Ok(session)
}

/// Persists the attempt, then removes the session. On a store failure
/// the session survives for a retried save.
async fn persist_and_close(
    state: &AppState,
    token: Uuid,
    attempt: &QuizAttempt,
) -> Result<(), AppError> {
    state.store.save_attempt(attempt).await.map_err(|e| {
        tracing::error!("Failed to save attempt {}: {}", attempt.id, e);
        e
    })?;

    state.sessions.write().await.remove(&token);
    Ok(())
}
