//! Auth service: the request/response contract the outer layers call.
//!
//! Each operation returns a closed result enum. Storage failures surface as
//! `StorageFailure`, never as a panic or a raw database error.

use crate::clock::Clock;
use crate::db::{DbError, NewUser, User, UserSummary};
use crate::error::{AuthError, Conflict, FieldError};
use crate::metrics;
use crate::security::{dummy_verify, hash_password, verify_password};
use crate::session::SessionManager;
use crate::store::{CredentialStore, bounded};
use crate::validation::{validate_new_user, validate_password};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Outcome of [`AuthService::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterResult {
    Created,
    AlreadyRegistered,
    UsernameTaken,
    /// A field failed validation before anything was stored.
    Rejected(FieldError),
    StorageFailure,
}

/// A successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub token: String,
    pub profile: UserSummary,
}

impl fmt::Debug for Authenticated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticated")
            .field("token", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

/// Outcome of [`AuthService::login`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    Authenticated(Authenticated),
    /// Unknown username or wrong password; the two are not distinguished.
    InvalidCredentials,
    StorageFailure,
}

/// Outcome of [`AuthService::validate_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionResult {
    Active(UserSummary),
    Invalid,
    StorageFailure,
}

/// Outcome of [`AuthService::logout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutResult {
    Revoked,
    NotFound,
    StorageFailure,
}

/// Registration, login and session checks over a [`CredentialStore`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    sessions: SessionManager,
    clock: Arc<dyn Clock>,
    storage_timeout: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
        session_ttl: Duration,
        storage_timeout: Duration,
    ) -> Self {
        let sessions = SessionManager::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            session_ttl,
            storage_timeout,
        );
        Self {
            store,
            sessions,
            clock,
            storage_timeout,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ========== Typed contract ==========

    /// Register a user with a plaintext password.
    pub async fn register(&self, user: NewUser, password: &str) -> RegisterResult {
        match self.try_register(user, password).await {
            Ok(_) => RegisterResult::Created,
            Err(AuthError::Conflict(Conflict::IdentityRegistered)) => {
                RegisterResult::AlreadyRegistered
            }
            Err(AuthError::Conflict(Conflict::UsernameTaken)) => RegisterResult::UsernameTaken,
            Err(AuthError::Validation(e)) => RegisterResult::Rejected(e),
            Err(_) => RegisterResult::StorageFailure,
        }
    }

    /// Check a username/password pair and open a session.
    pub async fn login(&self, username: &str, password: &str) -> LoginResult {
        match self.try_login(username, password).await {
            Ok(authenticated) => LoginResult::Authenticated(authenticated),
            Err(AuthError::Storage(_)) => LoginResult::StorageFailure,
            Err(_) => LoginResult::InvalidCredentials,
        }
    }

    /// Resolve a bearer token, renewing it when valid.
    pub async fn validate_session(&self, token: &str) -> SessionResult {
        let result = match self.sessions.validate(token).await {
            Ok(Some(owner)) => SessionResult::Active(owner),
            Ok(None) => SessionResult::Invalid,
            Err(e) => {
                warn!(error = %e, "Session validation failed");
                SessionResult::StorageFailure
            }
        };
        metrics::record_session_check(match &result {
            SessionResult::Active(_) => "active",
            SessionResult::Invalid => "invalid",
            SessionResult::StorageFailure => "storage",
        });
        result
    }

    /// Revoke a bearer token.
    pub async fn logout(&self, token: &str) -> LogoutResult {
        match self.sessions.revoke(token).await {
            Ok(true) => {
                info!("Session revoked");
                LogoutResult::Revoked
            }
            Ok(false) => LogoutResult::NotFound,
            Err(e) => {
                warn!(error = %e, "Logout failed");
                LogoutResult::StorageFailure
            }
        }
    }

    /// Look up a registered user's profile by identity.
    pub async fn profile(&self, identity: i64) -> Result<Option<User>, AuthError> {
        Ok(bounded(self.storage_timeout, self.store.find_user(identity)).await?)
    }

    // ========== Fallible core (used by the dialogue engine) ==========

    /// Validate, hash and insert a registration.
    pub async fn try_register(&self, user: NewUser, password: &str) -> Result<User, AuthError> {
        let outcome = self.register_inner(user, password).await;
        match &outcome {
            Ok(user) => {
                info!(identity = user.identity, username = %user.username, role = %user.role, "User registered");
                metrics::record_registration("created");
            }
            Err(e) => {
                if e.is_retryable() {
                    warn!(error = %e, "Registration failed");
                }
                metrics::record_registration(e.error_code());
            }
        }
        outcome
    }

    async fn register_inner(&self, user: NewUser, password: &str) -> Result<User, AuthError> {
        let user = validate_new_user(user, self.clock.today())?;
        validate_password(password)?;

        let digest = tokio::task::spawn_blocking({
            let password = Zeroizing::new(password.to_owned());
            move || hash_password(&password)
        })
        .await
        .map_err(|e| internal(format!("hash task failed: {e}")))?
        .map_err(|e| internal(e.to_string()))?;
        let now = self.clock.now();

        let created = bounded(
            self.storage_timeout,
            self.store.insert_user_if_absent(&user, &digest, now),
        )
        .await?;
        Ok(created)
    }

    /// Verify credentials and issue a token.
    pub async fn try_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Authenticated, AuthError> {
        let outcome = self.login_inner(username, password).await;
        match &outcome {
            Ok(auth) => {
                info!(identity = auth.profile.identity, "User logged in");
                metrics::record_login("authenticated");
            }
            Err(e) => metrics::record_login(e.error_code()),
        }
        outcome
    }

    async fn login_inner(&self, username: &str, password: &str) -> Result<Authenticated, AuthError> {
        let username = username.trim();
        let stored = bounded(self.storage_timeout, self.store.find_credentials(username)).await?;

        // Argon2 is CPU-bound; an unknown username still pays for one verify.
        let digest = stored.as_ref().map(|s| s.password_hash.clone());
        let valid = tokio::task::spawn_blocking({
            let password = Zeroizing::new(password.to_owned());
            move || match digest {
                Some(digest) => verify_password(&password, &digest),
                None => {
                    dummy_verify(&password);
                    false
                }
            }
        })
        .await
        .map_err(|e| internal(format!("verify task failed: {e}")))?;

        let Some(stored) = stored.filter(|_| valid) else {
            return Err(AuthError::InvalidCredentials);
        };

        let identity = stored.user.identity;
        if let Err(e) = bounded(
            self.storage_timeout,
            self.store.touch_last_access(identity, self.clock.now()),
        )
        .await
        {
            warn!(identity, error = %e, "Failed to record last access");
        }

        let token = self.sessions.issue(identity).await?;
        Ok(Authenticated {
            token,
            profile: stored.user.summary(),
        })
    }
}

fn internal(message: String) -> AuthError {
    AuthError::Storage(DbError::Internal(message))
}
