// src/session.rs

//! Server-side owners of active play-throughs.
//!
//! Each session is keyed by an opaque token and holds one [`QuizPlayer`]
//! plus its start time. There is no background timer task: every access
//! first replays the wall-clock seconds elapsed since the start into the
//! state machine, so timer expiry is honored lazily.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::attempt::QuizAttempt;
use crate::models::quiz::Quiz;
use crate::player::{AnswerFeedback, OptionState, Phase, QuizPlayer};

pub struct PlaySession {
    token: Uuid,
    started_at: DateTime<Utc>,
    ticks_applied: u64,
    player: QuizPlayer,
}

impl PlaySession {
    pub fn new(quiz: Quiz, student_id: Uuid) -> Self {
        Self {
            token: Uuid::new_v4(),
            started_at: Utc::now(),
            ticks_applied: 0,
            player: QuizPlayer::new(quiz, student_id),
        }
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn student_id(&self) -> Uuid {
        self.player.student_id()
    }

    /// Replays wall-clock time into the machine. Must run before any
    /// player interaction so an expired budget forces submission first.
    pub fn sync(&mut self) {
        let elapsed = (Utc::now() - self.started_at).num_seconds().max(0) as u64;
        if elapsed > self.ticks_applied {
            self.player.elapse(elapsed - self.ticks_applied);
            self.ticks_applied = elapsed;
        }
    }

    pub fn player(&self) -> &QuizPlayer {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut QuizPlayer {
        &mut self.player
    }

    /// Snapshot of everything a client needs to render the play screen.
    pub fn view(&self) -> PlayView {
        let player = &self.player;
        let question = player.current_question().map(|q| QuestionView {
            id: q.id,
            text: q.text.clone(),
            options: q.options.clone(),
            option_states: (0..q.options.len()).map(|i| player.option_state(i)).collect(),
        });

        PlayView {
            token: self.token,
            quiz_id: player.quiz().id,
            quiz_title: player.quiz().title.clone(),
            phase: player.phase(),
            question_number: question.as_ref().map(|_| player.question_index() + 1),
            total_questions: player.total_questions(),
            question,
            remaining_seconds: player.remaining_seconds(),
            progress_percent: player.progress_percent(),
            feedback: player.feedback().cloned(),
            attempt: player.attempt().cloned(),
        }
    }
}

/// The current question, without its answer key. Feedback (not this
/// view) is what reveals the correct index after a choice is locked in.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub option_states: Vec<OptionState>,
}

#[derive(Debug, Serialize)]
pub struct PlayView {
    pub token: Uuid,
    pub quiz_id: Uuid,
    pub quiz_title: String,
    pub phase: Phase,
    /// 1-based; absent once submitted.
    pub question_number: Option<usize>,
    pub total_questions: usize,
    pub question: Option<QuestionView>,
    pub remaining_seconds: u32,
    pub progress_percent: u32,
    pub feedback: Option<AnswerFeedback>,
    pub attempt: Option<QuizAttempt>,
}
