//! Persistence contract consumed by the auth core.
//!
//! The core never talks to SQL directly; it goes through [`CredentialStore`],
//! which [`Database`] implements. Every call made by the core is bounded by a
//! timeout so a wedged store fails with [`DbError::Timeout`] instead of hanging.

use crate::db::{Database, DbError, NewUser, SessionRecord, StoredCredentials, User, UserSummary};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user keyed by identity with `DO NOTHING` on identity conflict.
    async fn insert_user_if_absent(
        &self,
        user: &NewUser,
        password_hash: &str,
        now: i64,
    ) -> Result<User, DbError>;

    /// Look up a user and password digest by username.
    async fn find_credentials(&self, username: &str)
    -> Result<Option<StoredCredentials>, DbError>;

    /// Look up a user by external identity.
    async fn find_user(&self, identity: i64) -> Result<Option<User>, DbError>;

    /// Record authenticated activity (audit only).
    async fn touch_last_access(&self, identity: i64, now: i64) -> Result<(), DbError>;

    async fn insert_session(&self, record: &SessionRecord) -> Result<(), DbError>;

    /// Fetch a token row joined with its owner.
    async fn find_session(
        &self,
        token: &str,
    ) -> Result<Option<(SessionRecord, UserSummary)>, DbError>;

    async fn extend_session(&self, token: &str, expires_at: i64) -> Result<(), DbError>;

    /// Delete a token; `Ok(false)` when nothing matched.
    async fn delete_session(&self, token: &str) -> Result<bool, DbError>;

    /// Reclaim expired token rows.
    async fn purge_expired_sessions(&self, now: i64) -> Result<u64, DbError>;
}

#[async_trait]
impl CredentialStore for Database {
    async fn insert_user_if_absent(
        &self,
        user: &NewUser,
        password_hash: &str,
        now: i64,
    ) -> Result<User, DbError> {
        self.users().insert_if_absent(user, password_hash, now).await
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, DbError> {
        self.users().find_credentials(username).await
    }

    async fn find_user(&self, identity: i64) -> Result<Option<User>, DbError> {
        self.users().find_by_identity(identity).await
    }

    async fn touch_last_access(&self, identity: i64, now: i64) -> Result<(), DbError> {
        self.users().touch_last_access(identity, now).await
    }

    async fn insert_session(&self, record: &SessionRecord) -> Result<(), DbError> {
        self.sessions().insert(record).await
    }

    async fn find_session(
        &self,
        token: &str,
    ) -> Result<Option<(SessionRecord, UserSummary)>, DbError> {
        self.sessions().find_with_owner(token).await
    }

    async fn extend_session(&self, token: &str, expires_at: i64) -> Result<(), DbError> {
        self.sessions().extend(token, expires_at).await
    }

    async fn delete_session(&self, token: &str) -> Result<bool, DbError> {
        self.sessions().delete(token).await
    }

    async fn purge_expired_sessions(&self, now: i64) -> Result<u64, DbError> {
        self.sessions().purge_expired(now).await
    }
}

/// Run a store call with an upper bound on its duration.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, DbError>
where
    F: Future<Output = Result<T, DbError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DbError::Timeout(limit)),
    }
}
