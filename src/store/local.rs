// src/store/local.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{attempt::QuizAttempt, quiz::Quiz, user::User};
use crate::store::Store;

/// Everything the local store knows, serialized as one JSON document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    quizzes: Vec<Quiz>,
    #[serde(default)]
    attempts: Vec<QuizAttempt>,
}

/// Development fallback store: a single JSON snapshot file, rewritten in
/// full on every mutation. Selected when no DATABASE_URL is configured.
pub struct LocalStore {
    path: PathBuf,
    data: Mutex<Snapshot>,
}

impl LocalStore {
    /// Opens (or initializes) the snapshot at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AppError::InternalServerError(format!("Corrupt data file: {e}")))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    async fn persist(&self, data: &Snapshot) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(data)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for LocalStore {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let data = self.data.lock().await;
        Ok(data.quizzes.clone())
    }

    async fn get_quiz(&self, id: Uuid) -> Result<Option<Quiz>, AppError> {
        let data = self.data.lock().await;
        Ok(data.quizzes.iter().find(|q| q.id == id).cloned())
    }

    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), AppError> {
        let mut data = self.data.lock().await;
        match data.quizzes.iter_mut().find(|q| q.id == quiz.id) {
            Some(existing) => *existing = quiz.clone(),
            None => data.quizzes.push(quiz.clone()),
        }
        self.persist(&data).await
    }

    async fn delete_quiz(&self, id: Uuid) -> Result<bool, AppError> {
        let mut data = self.data.lock().await;
        let before = data.quizzes.len();
        data.quizzes.retain(|q| q.id != id);
        if data.quizzes.len() == before {
            return Ok(false);
        }
        self.persist(&data).await?;
        Ok(true)
    }

    async fn list_attempts(&self, student_id: Option<Uuid>) -> Result<Vec<QuizAttempt>, AppError> {
        let data = self.data.lock().await;
        Ok(data
            .attempts
            .iter()
            .filter(|a| student_id.is_none_or(|s| a.student_id == s))
            .cloned()
            .collect())
    }

    async fn save_attempt(&self, attempt: &QuizAttempt) -> Result<(), AppError> {
        let mut data = self.data.lock().await;
        // Replaying an already-stored attempt id is a no-op.
        if data.attempts.iter().any(|a| a.id == attempt.id) {
            return Ok(());
        }
        data.attempts.push(attempt.clone());
        self.persist(&data).await
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let mut data = self.data.lock().await;
        if data
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::Conflict(
                "Username or email already registered".to_string(),
            ));
        }
        data.users.push(user.clone());
        self.persist(&data).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let data = self.data.lock().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let data = self.data.lock().await;
        Ok(data
            .users
            .iter()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let data = self.data.lock().await;
        Ok(data.users.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let mut data = self.data.lock().await;
        let before = data.users.len();
        data.users.retain(|u| u.id != id);
        if data.users.len() == before {
            return Ok(false);
        }
        self.persist(&data).await?;
        Ok(true)
    }
}
