// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed play-through of a quiz, immutable once stored.
///
/// `answers` runs parallel to the quiz's question list; -1 marks a
/// question the student never answered before time ran out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub student_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub answers: Vec<i32>,
    pub completed_at: DateTime<Utc>,
}

/// Per-quiz performance summary for the stats view.
#[derive(Debug, Serialize)]
pub struct QuizStat {
    pub quiz_id: Uuid,
    pub title: String,
    /// Best score across attempts, as a rounded percentage.
    pub best_percent: u32,
    pub attempt_count: usize,
}

/// Aggregated performance for the current user.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub per_quiz: Vec<QuizStat>,
    /// Average of the per-quiz best percentages, rounded.
    pub aggregate_percent: u32,
}
