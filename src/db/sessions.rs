//! Session token repository.

use super::{DbError, Role, UserSummary};
use sqlx::SqlitePool;
use std::fmt;

/// A stored session token row.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: String,
    pub identity: i64,
    pub created_at: i64,
    pub expires_at: i64,
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("token", &"<redacted>")
            .field("identity", &self.identity)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Repository for session token operations.
pub struct SessionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new session repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a freshly issued token.
    pub async fn insert(&self, record: &SessionRecord) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, identity, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&record.token)
        .bind(record.identity)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a token together with its owner's summary.
    ///
    /// Expired rows are returned too; the caller decides validity.
    pub async fn find_with_owner(
        &self,
        token: &str,
    ) -> Result<Option<(SessionRecord, UserSummary)>, DbError> {
        let row = sqlx::query_as::<_, (String, i64, i64, i64, String, String, String)>(
            r#"
            SELECT s.token, s.identity, s.created_at, s.expires_at, u.name, u.surname, u.role
            FROM sessions s
            JOIN users u ON s.identity = u.identity
            WHERE s.token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.map(
            |(token, identity, created_at, expires_at, name, surname, role)| {
                let role = role
                    .parse::<Role>()
                    .map_err(|e| DbError::Corrupt(format!("users.role for {identity}: {e}")))?;
                Ok((
                    SessionRecord {
                        token,
                        identity,
                        created_at,
                        expires_at,
                    },
                    UserSummary {
                        identity,
                        name,
                        surname,
                        role,
                    },
                ))
            },
        )
        .transpose()
    }

    /// Move a token's expiry.
    pub async fn extend(&self, token: &str, expires_at: i64) -> Result<(), DbError> {
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE token = ?")
            .bind(expires_at)
            .bind(token)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Delete a token. Returns whether a row was removed.
    pub async fn delete(&self, token: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every token whose expiry is at or before `now`.
    pub async fn purge_expired(&self, now: i64) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
