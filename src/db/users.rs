//! User repository.
//!
//! Handles user registration, credential lookup and last-access bookkeeping.

use super::DbError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;

/// Role a user plays at events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Follower,
    Leader,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follower => "follower",
            Self::Leader => "leader",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "follower" => Ok(Self::Follower),
            "leader" => Ok(Self::Leader),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub identity: i64,
    pub name: String,
    pub surname: String,
    pub birthdate: NaiveDate,
    pub username: String,
    pub role: Role,
    pub created_at: i64,
    pub last_access: Option<i64>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            identity: self.identity,
            name: self.name.clone(),
            surname: self.surname.clone(),
            role: self.role,
        }
    }
}

/// Identity snapshot handed out with a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub identity: i64,
    pub name: String,
    pub surname: String,
    pub role: Role,
}

/// Profile data for a registration, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub identity: i64,
    pub name: String,
    pub surname: String,
    pub birthdate: NaiveDate,
    pub username: String,
    pub role: Role,
}

/// A user together with the stored password digest, used only for login.
#[derive(Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("user", &self.user)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

type UserRow = (i64, String, String, String, String, String, i64, Option<i64>);

fn user_from_row(row: UserRow) -> Result<User, DbError> {
    let (identity, name, surname, birthdate, username, role, created_at, last_access) = row;
    let birthdate = NaiveDate::parse_from_str(&birthdate, "%Y-%m-%d")
        .map_err(|e| DbError::Corrupt(format!("users.birthdate for {identity}: {e}")))?;
    let role = role
        .parse::<Role>()
        .map_err(|e| DbError::Corrupt(format!("users.role for {identity}: {e}")))?;
    Ok(User {
        identity,
        name,
        surname,
        birthdate,
        username,
        role,
        created_at,
        last_access,
    })
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user unless the identity is already registered.
    ///
    /// Conflicts on identity resolve as `DO NOTHING` and are reported as
    /// [`DbError::IdentityRegistered`]; the UNIQUE username constraint is
    /// reported as [`DbError::UsernameTaken`].
    pub async fn insert_if_absent(
        &self,
        user: &NewUser,
        password_hash: &str,
        now: i64,
    ) -> Result<User, DbError> {
        let birthdate = user.birthdate.format("%Y-%m-%d").to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO users (identity, name, surname, birthdate, username, password_hash, role, created_at, last_access)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (identity) DO NOTHING
            "#,
        )
        .bind(user.identity)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(&birthdate)
        .bind(&user.username)
        .bind(password_hash)
        .bind(user.role.as_str())
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                // Only the username index can still fire here, but read the
                // message anyway so a primary-key hit is never misreported.
                if db_err.message().contains("users.identity") {
                    return DbError::IdentityRegistered(user.identity);
                }
                return DbError::UsernameTaken(user.username.clone());
            }
            DbError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::IdentityRegistered(user.identity));
        }

        Ok(User {
            identity: user.identity,
            name: user.name.clone(),
            surname: user.surname.clone(),
            birthdate: user.birthdate,
            username: user.username.clone(),
            role: user.role,
            created_at: now,
            last_access: Some(now),
        })
    }

    /// Find a user and their password digest by username.
    pub async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, String, String, String, String, i64, Option<i64>, String)>(
            r#"
            SELECT identity, name, surname, birthdate, username, role, created_at, last_access, password_hash
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(|(identity, name, surname, birthdate, username, role, created_at, last_access, password_hash)| {
            let user = user_from_row((
                identity, name, surname, birthdate, username, role, created_at, last_access,
            ))?;
            Ok(StoredCredentials {
                user,
                password_hash,
            })
        })
        .transpose()
    }

    /// Find user by identity.
    pub async fn find_by_identity(&self, identity: i64) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT identity, name, surname, birthdate, username, role, created_at, last_access
            FROM users
            WHERE identity = ?
            "#,
        )
        .bind(identity)
        .fetch_optional(self.pool)
        .await?;

        row.map(user_from_row).transpose()
    }

    /// Record authenticated activity for a user.
    pub async fn touch_last_access(&self, identity: i64, now: i64) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET last_access = ? WHERE identity = ?")
            .bind(now)
            .bind(identity)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
