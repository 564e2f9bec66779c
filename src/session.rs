//! Session manager: bearer tokens with sliding expiry.
//!
//! A token is usable while `now < expires_at`. Every successful validation
//! pushes `expires_at` to `now + ttl`. Unknown and expired tokens look the
//! same to callers. `last_access` on the user is touched for auditing only
//! and plays no part in deciding validity.

use crate::clock::Clock;
use crate::db::{DbError, SessionRecord, UserSummary};
use crate::metrics;
use crate::security::generate_token;
use crate::store::{CredentialStore, bounded};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Issues, validates and revokes session tokens.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    ttl_secs: i64,
    storage_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
            storage_timeout,
        }
    }

    /// Create and store a new token for `identity`.
    pub async fn issue(&self, identity: i64) -> Result<String, DbError> {
        let now = self.clock.now();
        let record = SessionRecord {
            token: generate_token(),
            identity,
            created_at: now,
            expires_at: now.saturating_add(self.ttl_secs),
        };

        bounded(self.storage_timeout, self.store.insert_session(&record)).await?;
        debug!(identity, expires_at = record.expires_at, "Session issued");
        Ok(record.token)
    }

    /// Resolve a token to its owner, renewing it on success.
    ///
    /// Returns `Ok(None)` for both unknown and expired tokens.
    pub async fn validate(&self, token: &str) -> Result<Option<UserSummary>, DbError> {
        let Some((record, owner)) =
            bounded(self.storage_timeout, self.store.find_session(token)).await?
        else {
            return Ok(None);
        };

        let now = self.clock.now();
        if now >= record.expires_at {
            debug!(identity = record.identity, "Session expired");
            return Ok(None);
        }

        // Two concurrent renewals of the same token both land on now + ttl,
        // so no ordering between them is needed.
        let expires_at = now.saturating_add(self.ttl_secs);
        bounded(
            self.storage_timeout,
            self.store.extend_session(token, expires_at),
        )
        .await?;

        if let Err(e) = bounded(
            self.storage_timeout,
            self.store.touch_last_access(owner.identity, now),
        )
        .await
        {
            warn!(identity = owner.identity, error = %e, "Failed to record last access");
        }

        Ok(Some(owner))
    }

    /// Delete a token. `Ok(false)` means there was nothing to revoke.
    pub async fn revoke(&self, token: &str) -> Result<bool, DbError> {
        bounded(self.storage_timeout, self.store.delete_session(token)).await
    }

    /// Reclaim rows whose expiry has passed.
    pub async fn purge_expired(&self) -> Result<u64, DbError> {
        let now = self.clock.now();
        bounded(self.storage_timeout, self.store.purge_expired_sessions(now)).await
    }
}

/// Spawn the background task that periodically deletes expired sessions.
pub fn spawn_purge_task(sessions: SessionManager, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);

        loop {
            interval.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => {
                    info!(purged, "Purged expired sessions");
                    metrics::record_sessions_purged(purged);
                }
                Err(e) => warn!(error = %e, "Session purge failed"),
            }
        }
    })
}
