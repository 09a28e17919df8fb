// src/handlers/assistant.rs

//! Assistant endpoints. None of these can fail on the AI path: a missing
//! key, a dead upstream or the faculty kill switch all surface as a
//! normal 200 with `fallback: true` and a fixed string, so the client
//! flow never branches on errors.

use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::Ordering;
use validator::Validate;

use crate::{
    ai::{ASSISTANT_DISABLED, AiReply, ChatMessage},
    error::AppError,
    models::quiz::OPTIONS_PER_QUESTION,
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must not be empty."))]
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct AssistantResponse {
    pub reply: String,
    pub fallback: bool,
}

impl From<AiReply> for AssistantResponse {
    fn from(reply: AiReply) -> Self {
        Self {
            fallback: reply.is_fallback(),
            reply: reply.text().to_string(),
        }
    }
}

fn disabled_response() -> AssistantResponse {
    AssistantResponse {
        reply: ASSISTANT_DISABLED.to_string(),
        fallback: true,
    }
}

/// Free-form tutor chat.
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if !state.assistant_enabled.load(Ordering::Relaxed) {
        return Ok(Json(disabled_response()));
    }

    let reply = state.ai.chat(&payload.message, &payload.history).await;

    Ok(Json(AssistantResponse::from(reply)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExplainRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub chosen_answer: usize,
}

/// Explains why the chosen option was wrong after feedback.
pub async fn explain(
    State(state): State<AppState>,
    Json(payload): Json<ExplainRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    if payload.options.len() != OPTIONS_PER_QUESTION
        || payload.correct_answer >= payload.options.len()
        || payload.chosen_answer >= payload.options.len()
    {
        return Err(AppError::BadRequest(
            "Options and answer indices are inconsistent".to_string(),
        ));
    }

    if !state.assistant_enabled.load(Ordering::Relaxed) {
        return Ok(Json(disabled_response()));
    }

    let reply = state
        .ai
        .explain_wrong_answer(
            &payload.question_text,
            &payload.options,
            payload.correct_answer,
            payload.chosen_answer,
        )
        .await;

    Ok(Json(AssistantResponse::from(reply)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 200, message = "A topic is required."))]
    pub topic: String,
    pub count: Option<usize>,
}

/// Drafts questions about a topic for the quiz editor.
/// Admin only.
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let count = payload.count.unwrap_or(5).clamp(1, 10);

    if !state.assistant_enabled.load(Ordering::Relaxed) {
        return Ok(Json(json!({
            "questions": [],
            "fallback": true,
            "reason": ASSISTANT_DISABLED,
        }))
        .into_response());
    }

    let batch = state.ai.generate_questions(&payload.topic, count).await;

    Ok(Json(batch).into_response())
}
