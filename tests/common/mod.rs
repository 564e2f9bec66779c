//! Integration test common infrastructure.
//!
//! Builds an auth stack over an in-memory database with a manual clock, and
//! a store wrapper that can be switched into failure or stall modes.

#![allow(dead_code)]

use async_trait::async_trait;
use bookbot_auth::clock::ManualClock;
use bookbot_auth::db::{
    Database, DbError, NewUser, Role, SessionRecord, StoredCredentials, User, UserSummary,
};
use bookbot_auth::dialogue::{DialogueEffect, DialogueEngine, DialogueEvent};
use bookbot_auth::services::AuthService;
use bookbot_auth::store::CredentialStore;
use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

pub const SESSION_TTL: Duration = Duration::from_secs(30 * 60);
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);
pub const STORAGE_TIMEOUT: Duration = Duration::from_secs(2);

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

pub fn new_user(identity: i64, username: &str) -> NewUser {
    NewUser {
        identity,
        name: "Ana".to_string(),
        surname: "Lee".to_string(),
        birthdate: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        username: username.to_string(),
        role: Role::Follower,
    }
}

/// Everything a test needs, wired the way `main` wires it.
pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub clock: Arc<ManualClock>,
    pub auth: AuthService,
    pub engine: Arc<DialogueEngine>,
}

impl Harness {
    pub async fn new() -> anyhow::Result<Self> {
        let db = Database::new(":memory:").await?;
        let store = Arc::new(FlakyStore::new(db));
        let clock = Arc::new(ManualClock::at_date(today()));
        let auth = AuthService::new(store.clone(), clock.clone(), SESSION_TTL, STORAGE_TIMEOUT);
        let engine = Arc::new(DialogueEngine::new(auth.clone(), IDLE_TIMEOUT));
        Ok(Self {
            store,
            clock,
            auth,
            engine,
        })
    }

    pub async fn send(&self, identity: i64, event: DialogueEvent) -> Vec<DialogueEffect> {
        self.engine.handle(identity, event).await
    }

    pub async fn say(&self, identity: i64, message_id: i64, text: &str) -> Vec<DialogueEffect> {
        self.engine
            .handle(identity, DialogueEvent::text(message_id, text))
            .await
    }
}

/// First text of a batch of effects.
pub fn first_text(effects: &[DialogueEffect]) -> &str {
    effects.iter().find_map(DialogueEffect::text).unwrap_or_default()
}

const HEALTHY: u8 = 0;
const FAILING: u8 = 1;
const STALLED: u8 = 2;

/// Delegates to a real [`Database`] unless told to fail or stall.
pub struct FlakyStore {
    inner: Database,
    mode: AtomicU8,
}

impl FlakyStore {
    pub fn new(inner: Database) -> Self {
        Self {
            inner,
            mode: AtomicU8::new(HEALTHY),
        }
    }

    pub fn heal(&self) {
        self.mode.store(HEALTHY, Ordering::SeqCst);
    }

    pub fn fail(&self) {
        self.mode.store(FAILING, Ordering::SeqCst);
    }

    pub fn stall(&self) {
        self.mode.store(STALLED, Ordering::SeqCst);
    }

    pub fn database(&self) -> &Database {
        &self.inner
    }

    async fn gate(&self) -> Result<(), DbError> {
        match self.mode.load(Ordering::SeqCst) {
            FAILING => Err(DbError::Internal("injected failure".to_string())),
            STALLED => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CredentialStore for FlakyStore {
    async fn insert_user_if_absent(
        &self,
        user: &NewUser,
        password_hash: &str,
        now: i64,
    ) -> Result<User, DbError> {
        self.gate().await?;
        self.inner.insert_user_if_absent(user, password_hash, now).await
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, DbError> {
        self.gate().await?;
        self.inner.find_credentials(username).await
    }

    async fn find_user(&self, identity: i64) -> Result<Option<User>, DbError> {
        self.gate().await?;
        self.inner.find_user(identity).await
    }

    async fn touch_last_access(&self, identity: i64, now: i64) -> Result<(), DbError> {
        self.gate().await?;
        self.inner.touch_last_access(identity, now).await
    }

    async fn insert_session(&self, record: &SessionRecord) -> Result<(), DbError> {
        self.gate().await?;
        self.inner.insert_session(record).await
    }

    async fn find_session(
        &self,
        token: &str,
    ) -> Result<Option<(SessionRecord, UserSummary)>, DbError> {
        self.gate().await?;
        self.inner.find_session(token).await
    }

    async fn extend_session(&self, token: &str, expires_at: i64) -> Result<(), DbError> {
        self.gate().await?;
        self.inner.extend_session(token, expires_at).await
    }

    async fn delete_session(&self, token: &str) -> Result<bool, DbError> {
        self.gate().await?;
        self.inner.delete_session(token).await
    }

    async fn purge_expired_sessions(&self, now: i64) -> Result<u64, DbError> {
        self.gate().await?;
        self.inner.purge_expired_sessions(now).await
    }
}
