// src/handlers/quizzes.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        attempt::{QuizStat, StatsResponse},
        quiz::PublicQuiz,
        user::Role,
    },
    state::AppState,
    utils::jwt::Claims,
};

/// Lists the quiz catalog.
///
/// Students receive answer-free projections; faculty get the full
/// documents for the console.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, AppError> {
    let quizzes = state.store.list_quizzes().await?;

    let response = match claims.role {
        Role::Admin => Json(quizzes).into_response(),
        Role::Student => {
            let catalog: Vec<PublicQuiz> = quizzes.iter().map(PublicQuiz::from).collect();
            Json(catalog).into_response()
        }
    };

    Ok(response)
}

/// Fetches a single quiz, answer-free for students.
pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let quiz = state
        .store
        .get_quiz(id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let response = match claims.role {
        Role::Admin => Json(quiz).into_response(),
        Role::Student => Json(PublicQuiz::from(&quiz)).into_response(),
    };

    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct AttemptsQuery {
    pub student_id: Option<Uuid>,
}

/// Lists attempts. Students always see their own; faculty see everything
/// or one student's history via `?student_id=`.
pub async fn list_attempts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<AttemptsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = match claims.role {
        Role::Student => Some(claims.user_id()?),
        Role::Admin => query.student_id,
    };

    let attempts = state.store.list_attempts(filter).await?;

    Ok(Json(attempts))
}

/// Performance summary for the caller: per-quiz best percentage plus the
/// rounded average across quizzes with at least one attempt.
pub async fn stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let attempts = state.store.list_attempts(Some(student_id)).await?;
    let quizzes = state.store.list_quizzes().await?;

    let mut per_quiz = Vec::new();
    for quiz in &quizzes {
        let quiz_attempts: Vec<_> = attempts.iter().filter(|a| a.quiz_id == quiz.id).collect();
        if quiz_attempts.is_empty() {
            continue;
        }

        let best_percent = quiz_attempts
            .iter()
            .map(|a| {
                if a.total_questions > 0 {
                    (a.score as f64 * 100.0 / a.total_questions as f64).round() as u32
                } else {
                    0
                }
            })
            .max()
            .unwrap_or(0);

        per_quiz.push(QuizStat {
            quiz_id: quiz.id,
            title: quiz.title.clone(),
            best_percent,
            attempt_count: quiz_attempts.len(),
        });
    }

    let aggregate_percent = if per_quiz.is_empty() {
        0
    } else {
        let sum: u32 = per_quiz.iter().map(|s| s.best_percent).sum();
        (sum as f64 / per_quiz.len() as f64).round() as u32
    };

    Ok(Json(StatsResponse {
        per_quiz,
        aggregate_percent,
    }))
}
