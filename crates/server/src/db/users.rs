use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, query_as};

use super::StorageError;
use crate::auth::Identity;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
    pub preferred_username: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub realm: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: Option<&'a str>,
    pub email_verified: bool,
    pub name: Option<&'a str>,
    pub preferred_username: Option<&'a str>,
    pub given_name: Option<&'a str>,
    pub family_name: Option<&'a str>,
    pub realm: Option<&'a str>,
}

impl<'a> From<&'a Identity> for NewUser<'a> {
    fn from(identity: &'a Identity) -> Self {
        Self {
            id: identity.subject(),
            email: identity.email.as_deref(),
            email_verified: identity.email_verified.unwrap_or(false),
            name: identity.display_name.as_deref(),
            preferred_username: identity.preferred_username.as_deref(),
            given_name: identity.given_name.as_deref(),
            family_name: identity.family_name.as_deref(),
            realm: identity.realm.as_deref(),
        }
    }
}

/// Persistence for user profiles, keyed by the provider subject.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<UserRecord>, StorageError>;

    /// Inserts the user unless a row with the same subject exists. Returns whether a row was
    /// written; a duplicate is not an error.
    async fn insert(&self, user: NewUser<'_>) -> Result<bool, StorageError>;
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<UserRecord>, StorageError> {
        query_as::<_, UserRecord>(
            r#"
            SELECT
                id,
                email,
                email_verified,
                name,
                preferred_username,
                given_name,
                family_name,
                realm,
                created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)
    }

    async fn insert(&self, user: NewUser<'_>) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                id, email, email_verified, name, preferred_username, given_name, family_name, realm
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user.id)
        .bind(user.email)
        .bind(user.email_verified)
        .bind(user.name)
        .bind(user.preferred_username)
        .bind(user.given_name)
        .bind(user.family_name)
        .bind(user.realm)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
