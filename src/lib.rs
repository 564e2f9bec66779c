//! bookbot-auth - authentication and session engine for the event booking bot.
//!
//! Registration and login run as per-user dialogues driven by chat events.
//! Credentials are argon2-hashed in SQLite; sessions are opaque bearer tokens
//! with sliding expiry.

pub mod clock;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod error;
pub mod http;
pub mod metrics;
pub mod security;
pub mod services;
pub mod session;
pub mod store;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::Database;
pub use dialogue::DialogueEngine;
pub use error::{AuthError, FieldError};
pub use services::AuthService;
pub use store::CredentialStore;
