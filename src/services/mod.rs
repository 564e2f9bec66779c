//! Service boundary.
//!
//! [`auth::AuthService`] is the request/response contract shared by the
//! dialogue engine and the HTTP adapter.

pub mod auth;

pub use auth::{
    AuthService, Authenticated, LoginResult, LogoutResult, RegisterResult, SessionResult,
};
