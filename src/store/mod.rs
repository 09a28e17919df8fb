// src/store/mod.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{attempt::QuizAttempt, quiz::Quiz, user::User};

pub mod local;
pub mod postgres;

pub use local::LocalStore;
pub use postgres::PgStore;

/// Persistence boundary over the three record kinds.
///
/// Writes are at-least-once durable; `upsert_quiz` is last-write-wins and
/// `save_attempt` ignores a replay of an already-stored attempt id, so a
/// client retry after a failed response is harmless. No transactional
/// guarantees beyond that.
#[async_trait]
pub trait Store: Send + Sync {
    // --- Quizzes ---
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError>;
    async fn get_quiz(&self, id: Uuid) -> Result<Option<Quiz>, AppError>;
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), AppError>;
    /// Returns false when no quiz with that id existed.
    async fn delete_quiz(&self, id: Uuid) -> Result<bool, AppError>;

    // --- Attempts ---
    async fn list_attempts(&self, student_id: Option<Uuid>) -> Result<Vec<QuizAttempt>, AppError>;
    async fn save_attempt(&self, attempt: &QuizAttempt) -> Result<(), AppError>;

    // --- Users ---
    /// Fails with `Conflict` when the username or email is taken.
    async fn create_user(&self, user: &User) -> Result<(), AppError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    /// Looks a user up by username or email.
    async fn find_user(&self, identifier: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;
}
