// src/player.rs

//! The quiz-taking state machine.
//!
//! A [`QuizPlayer`] walks one student through a quiz's questions in order
//! under a wall-clock budget of `duration_minutes * 60` seconds. It is
//! pure and synchronous: callers feed it one-second ticks, it never does
//! IO, and it emits exactly one [`QuizAttempt`] per play-through.

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::models::attempt::QuizAttempt;
use crate::models::quiz::{Question, Quiz};

/// Marker for a question the student never answered.
pub const UNANSWERED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the student to pick an option.
    InProgress,
    /// Feedback for the chosen option is on display.
    AnswerShown,
    /// Terminal. The attempt has been produced.
    Submitted,
}

/// Visual state of one option, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionState {
    Unselected,
    SelectedPending,
    Correct,
    Incorrect,
    /// Neither chosen nor correct, after the reveal.
    Dimmed,
}

/// Feedback produced by answering the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub chosen: usize,
    pub correct: bool,
    pub correct_answer: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerError {
    /// The option index does not exist on the current question.
    OptionOutOfRange,
    /// `advance` requires feedback to be on display.
    NoFeedbackPending,
    /// `advance` called on the final question; submitting is the only move.
    FinalQuestion,
    /// Manual `submit` is only valid after answering the final question.
    NotOnFinalQuestion,
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PlayerError::OptionOutOfRange => "Selected option does not exist on this question",
            PlayerError::NoFeedbackPending => "No answer has been given for the current question",
            PlayerError::FinalQuestion => "Already on the final question; submit instead",
            PlayerError::NotOnFinalQuestion => {
                "Submission is only possible after answering the final question"
            }
        };
        f.write_str(msg)
    }
}

impl std::error::Error for PlayerError {}

/// Counts positions where the chosen option matches the correct one.
/// Unanswered (-1) positions never match.
pub fn score_answers(questions: &[Question], answers: &[i32]) -> i32 {
    questions
        .iter()
        .zip(answers)
        .filter(|(q, a)| **a == q.correct_answer as i32)
        .count() as i32
}

pub struct QuizPlayer {
    quiz: Quiz,
    student_id: Uuid,
    question_index: usize,
    answers: Vec<i32>,
    remaining_seconds: u32,
    feedback: Option<AnswerFeedback>,
    attempt: Option<QuizAttempt>,
}

impl QuizPlayer {
    /// Starts a play-through.
    ///
    /// A non-positive duration means the budget is already spent, and a
    /// quiz with no questions has nothing to ask: both submit immediately
    /// with every answer unanswered.
    pub fn new(quiz: Quiz, student_id: Uuid) -> Self {
        let total = quiz.questions.len();
        let budget = quiz.duration_minutes.max(0) as u32 * 60;

        let mut player = Self {
            quiz,
            student_id,
            question_index: 0,
            answers: vec![UNANSWERED; total],
            remaining_seconds: budget,
            feedback: None,
            attempt: None,
        };

        if total == 0 || budget == 0 {
            player.force_submit();
        }

        player
    }

    pub fn phase(&self) -> Phase {
        if self.attempt.is_some() {
            Phase::Submitted
        } else if self.feedback.is_some() {
            Phase::AnswerShown
        } else {
            Phase::InProgress
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn student_id(&self) -> Uuid {
        self.student_id
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn total_questions(&self) -> usize {
        self.quiz.questions.len()
    }

    /// The question currently on display; `None` once submitted.
    pub fn current_question(&self) -> Option<&Question> {
        if self.attempt.is_some() {
            None
        } else {
            self.quiz.questions.get(self.question_index)
        }
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Progress through the quiz as a rounded percentage,
    /// `(index + 1) / total * 100`.
    pub fn progress_percent(&self) -> u32 {
        let total = self.total_questions();
        if total == 0 || self.attempt.is_some() {
            return 100;
        }
        (((self.question_index + 1) * 100) as f64 / total as f64).round() as u32
    }

    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.attempt.is_some()
    }

    /// The emitted attempt, once the play-through is over.
    pub fn attempt(&self) -> Option<&QuizAttempt> {
        self.attempt.as_ref()
    }

    /// Rendering state for option `idx` of the current question.
    pub fn option_state(&self, idx: usize) -> OptionState {
        if let Some(fb) = &self.feedback {
            if idx == fb.correct_answer {
                OptionState::Correct
            } else if idx == fb.chosen {
                OptionState::Incorrect
            } else {
                OptionState::Dimmed
            }
        } else if self
            .answers
            .get(self.question_index)
            .is_some_and(|&a| a == idx as i32)
        {
            OptionState::SelectedPending
        } else {
            OptionState::Unselected
        }
    }

    /// Records the student's choice for the current question and reveals
    /// feedback.
    ///
    /// Returns `Ok(None)` when the selection is ignored: feedback is
    /// already on display (a question can never be re-answered) or the
    /// play-through is over.
    pub fn select_option(&mut self, idx: usize) -> Result<Option<&AnswerFeedback>, PlayerError> {
        if self.attempt.is_some() || self.feedback.is_some() {
            return Ok(None);
        }

        let question = &self.quiz.questions[self.question_index];
        if idx >= question.options.len() {
            return Err(PlayerError::OptionOutOfRange);
        }

        self.answers[self.question_index] = idx as i32;
        self.feedback = Some(AnswerFeedback {
            chosen: idx,
            correct: idx == question.correct_answer,
            correct_answer: question.correct_answer,
        });

        Ok(self.feedback.as_ref())
    }

    /// Moves past the displayed feedback to the next question.
    pub fn advance(&mut self) -> Result<(), PlayerError> {
        if self.attempt.is_some() {
            return Ok(());
        }
        if self.feedback.is_none() {
            return Err(PlayerError::NoFeedbackPending);
        }
        if self.question_index + 1 >= self.total_questions() {
            return Err(PlayerError::FinalQuestion);
        }

        self.feedback = None;
        self.question_index += 1;
        Ok(())
    }

    /// One second of wall-clock time. Reaching zero forces submission
    /// from any state; pending feedback is discarded.
    pub fn tick(&mut self) {
        if self.attempt.is_some() {
            return;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.force_submit();
        }
    }

    /// Applies `seconds` worth of ticks, stopping early once submitted.
    pub fn elapse(&mut self, seconds: u64) {
        for _ in 0..seconds {
            if self.attempt.is_some() {
                break;
            }
            self.tick();
        }
    }

    /// Submits after the final question's feedback. Forced submission on
    /// timer expiry goes through [`tick`]. Once submitted, repeat calls
    /// observe the same attempt.
    pub fn submit(&mut self) -> Result<&QuizAttempt, PlayerError> {
        if self.attempt.is_none() {
            if self.feedback.is_none() || self.question_index + 1 < self.total_questions() {
                return Err(PlayerError::NotOnFinalQuestion);
            }
            self.force_submit();
        }
        Ok(self.attempt.as_ref().expect("attempt exists after submit"))
    }

    fn force_submit(&mut self) {
        if self.attempt.is_some() {
            return;
        }
        self.feedback = None;
        let score = score_answers(&self.quiz.questions, &self.answers);
        self.attempt = Some(QuizAttempt {
            id: Uuid::new_v4(),
            quiz_id: self.quiz.id,
            student_id: self.student_id,
            score,
            total_questions: self.total_questions() as i32,
            answers: self.answers.clone(),
            completed_at: Utc::now(),
        });
    }
}
