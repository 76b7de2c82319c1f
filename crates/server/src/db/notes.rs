use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, query_as};

use super::StorageError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Note {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct NoteInput<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create(&self, owner: &str, note: NoteInput<'_>) -> Result<Note, StorageError>;

    /// Notes owned by `owner`, newest first.
    async fn list_for_owner(&self, owner: &str) -> Result<Vec<Note>, StorageError>;

    async fn find(&self, id: i64) -> Result<Option<Note>, StorageError>;

    /// `None` when no note with `id` belongs to `owner`.
    async fn update_owned(
        &self,
        id: i64,
        owner: &str,
        note: NoteInput<'_>,
    ) -> Result<Option<Note>, StorageError>;

    /// Whether a note with `id` belonging to `owner` was deleted.
    async fn delete_owned(&self, id: i64, owner: &str) -> Result<bool, StorageError>;
}

#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteStore for NoteRepository {
    async fn create(&self, owner: &str, note: NoteInput<'_>) -> Result<Note, StorageError> {
        query_as::<_, Note>(
            r#"
            INSERT INTO notes (user_id, title, content)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, content, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(note.title)
        .bind(note.content)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::from)
    }

    async fn list_for_owner(&self, owner: &str) -> Result<Vec<Note>, StorageError> {
        query_as::<_, Note>(
            r#"
            SELECT id, user_id, title, content, created_at, updated_at
            FROM notes
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)
    }

    async fn find(&self, id: i64) -> Result<Option<Note>, StorageError> {
        query_as::<_, Note>(
            r#"
            SELECT id, user_id, title, content, created_at, updated_at
            FROM notes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)
    }

    async fn update_owned(
        &self,
        id: i64,
        owner: &str,
        note: NoteInput<'_>,
    ) -> Result<Option<Note>, StorageError> {
        query_as::<_, Note>(
            r#"
            UPDATE notes
            SET title = $3,
                content = $4,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(note.title)
        .bind(note.content)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)
    }

    async fn delete_owned(&self, id: i64, owner: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
