// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    attempt::QuizAttempt,
    quiz::{Question, Quiz},
    user::{Role, User},
};
use crate::store::Store;

/// Hosted store backed by Postgres. Quiz questions and attempt answers
/// live in JSONB columns, keeping each quiz one editable document.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row helper for the `quizzes` table.
#[derive(sqlx::FromRow)]
struct QuizRow {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    duration_minutes: i32,
    questions: Json<Vec<Question>>,
    created_at: DateTime<Utc>,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Quiz {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            questions: row.questions.0,
            duration_minutes: row.duration_minutes,
            created_at: row.created_at,
        }
    }
}

/// Row helper for the `attempts` table.
#[derive(sqlx::FromRow)]
struct AttemptRow {
    id: Uuid,
    quiz_id: Uuid,
    student_id: Uuid,
    score: i32,
    total_questions: i32,
    answers: Json<Vec<i32>>,
    completed_at: DateTime<Utc>,
}

impl From<AttemptRow> for QuizAttempt {
    fn from(row: AttemptRow) -> Self {
        QuizAttempt {
            id: row.id,
            quiz_id: row.quiz_id,
            student_id: row.student_id,
            score: row.score,
            total_questions: row.total_questions,
            answers: row.answers.0,
            completed_at: row.completed_at,
        }
    }
}

/// Row helper for the `users` table. The role column holds the textual
/// role name and is parsed on the way out.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    name: String,
    email: String,
    role: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(AppError::InternalServerError)?;
        Ok(User {
            id: row.id,
            username: row.username,
            name: row.name,
            email: row.email,
            role,
            password: row.password,
            created_at: row.created_at,
        })
    }
}

fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::from(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let rows = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, title, description, category, duration_minutes, questions, created_at
            FROM quizzes
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            AppError::from(e)
        })?;

        Ok(rows.into_iter().map(Quiz::from).collect())
    }

    async fn get_quiz(&self, id: Uuid) -> Result<Option<Quiz>, AppError> {
        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            SELECT id, title, description, category, duration_minutes, questions, created_at
            FROM quizzes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Quiz::from))
    }

    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO quizzes (id, title, description, category, duration_minutes, questions, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                category = EXCLUDED.category,
                duration_minutes = EXCLUDED.duration_minutes,
                questions = EXCLUDED.questions
            "#,
        )
        .bind(quiz.id)
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(&quiz.category)
        .bind(quiz.duration_minutes)
        .bind(Json(&quiz.questions))
        .bind(quiz.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to upsert quiz: {:?}", e);
            AppError::from(e)
        })?;

        Ok(())
    }

    async fn delete_quiz(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_attempts(&self, student_id: Option<Uuid>) -> Result<Vec<QuizAttempt>, AppError> {
        let rows = match student_id {
            Some(student) => {
                sqlx::query_as::<_, AttemptRow>(
                    r#"
                    SELECT id, quiz_id, student_id, score, total_questions, answers, completed_at
                    FROM attempts
                    WHERE student_id = $1
                    ORDER BY completed_at DESC
                    "#,
                )
                .bind(student)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, AttemptRow>(
                    r#"
                    SELECT id, quiz_id, student_id, score, total_questions, answers, completed_at
                    FROM attempts
                    ORDER BY completed_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(QuizAttempt::from).collect())
    }

    async fn save_attempt(&self, attempt: &QuizAttempt) -> Result<(), AppError> {
        // A replayed save of the same attempt id is a no-op, so the
        // client-visible retry after a failed response cannot duplicate.
        sqlx::query(
            r#"
            INSERT INTO attempts (id, quiz_id, student_id, score, total_questions, answers, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.quiz_id)
        .bind(attempt.student_id)
        .bind(attempt.score)
        .bind(attempt.total_questions)
        .bind(Json(&attempt.answers))
        .bind(attempt.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save attempt: {:?}", e);
            AppError::from(e)
        })?;

        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, name, email, role, password, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(&user.password)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Username or email already registered"))?;

        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, name, email, role, password, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, name, email, role, password, created_at
            FROM users
            WHERE username = $1 OR email = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, name, email, role, password, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete user: {:?}", e);
                AppError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
