// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::utils::html::clean_html;

/// Every question carries exactly four options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A single multiple-choice question, embedded in its quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    /// Index into `options`; always in range for a built quiz.
    pub correct_answer: usize,
}

/// A quiz as authored by faculty and stored as one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub questions: Vec<Question>,
    /// Wall-clock time budget for one play-through.
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
}

/// DTO for sending a question to students (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            text: q.text.clone(),
            options: q.options.clone(),
        }
    }
}

/// Catalog entry for students: quiz metadata without any answer key.
#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub question_count: usize,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&Quiz> for PublicQuiz {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            category: quiz.category.clone(),
            question_count: quiz.questions.len(),
            duration_minutes: quiz.duration_minutes,
            created_at: quiz.created_at,
        }
    }
}

/// One question of a quiz draft. Also the shape the AI generator yields.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuestionDraft {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

/// DTO for authoring a quiz. A draft only becomes a [`Quiz`] through
/// [`QuizDraft::build`], which enforces completeness: a title, at least
/// one question, four non-empty options per question and a correct index
/// in range.
#[derive(Debug, Deserialize, Validate)]
pub struct QuizDraft {
    #[validate(length(min = 1, max = 200, message = "A quiz title is required."))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 100, message = "A category is required."))]
    pub category: String,
    #[validate(range(min = 1, max = 600, message = "Duration must be at least 1 minute."))]
    pub duration_minutes: i32,
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<QuestionDraft>,
}

fn validate_questions(questions: &[QuestionDraft]) -> Result<(), validator::ValidationError> {
    if questions.is_empty() {
        return Err(validator::ValidationError::new("questions_cannot_be_empty"));
    }
    for q in questions {
        if q.text.trim().is_empty() {
            return Err(validator::ValidationError::new("question_text_required"));
        }
        if q.text.len() > 1000 {
            return Err(validator::ValidationError::new("question_text_too_long"));
        }
        if q.options.len() != OPTIONS_PER_QUESTION {
            return Err(validator::ValidationError::new("four_options_required"));
        }
        if q.options.iter().any(|opt| opt.trim().is_empty()) {
            return Err(validator::ValidationError::new("option_text_required"));
        }
        if q.options.iter().any(|opt| opt.len() > 500) {
            return Err(validator::ValidationError::new("option_too_long"));
        }
        if q.correct_answer >= q.options.len() {
            return Err(validator::ValidationError::new("correct_answer_out_of_range"));
        }
    }
    Ok(())
}

impl QuizDraft {
    /// Validates the draft and yields a complete quiz.
    ///
    /// Passing `existing` keeps the quiz id (and creation time) stable
    /// across edits. Faculty-authored text is sanitized before storage.
    pub fn build(self, existing: Option<&Quiz>) -> Result<Quiz, AppError> {
        self.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let questions = self
            .questions
            .into_iter()
            .map(|q| Question {
                id: Uuid::new_v4(),
                text: clean_html(&q.text),
                options: q.options.iter().map(|opt| clean_html(opt)).collect(),
                correct_answer: q.correct_answer,
            })
            .collect();

        Ok(Quiz {
            id: existing.map(|q| q.id).unwrap_or_else(Uuid::new_v4),
            title: clean_html(&self.title),
            description: clean_html(&self.description),
            category: clean_html(&self.category),
            questions,
            duration_minutes: self.duration_minutes,
            created_at: existing.map(|q| q.created_at).unwrap_or_else(Utc::now),
        })
    }
}
