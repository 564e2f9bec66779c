//! Security primitives for the auth core.
//!
//! - **Password**: Argon2id hashing and verification
//! - **Token**: random bearer tokens for sessions

pub mod password;
pub mod token;

pub use password::{dummy_verify, hash_password, verify_password};
pub use token::generate_token;
