//! Password hashing and verification utilities.
//!
//! Centralizes Argon2 password handling for user registration and login.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use std::sync::OnceLock;

/// Digest used to burn verification time for unknown usernames.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Hash a password using default Argon2id settings and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    Ok(argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password against a stored Argon2 PHC string.
///
/// Malformed digests verify as `false`. The digest comparison itself is
/// constant-time inside argon2.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Spend roughly one verification's worth of CPU without a real account.
///
/// Called when a username does not exist so that "unknown user" and "wrong
/// password" take the same time.
pub fn dummy_verify(password: &str) {
    let digest = DUMMY_HASH.get_or_init(|| hash_password("bookbot-timing-equalizer").ok());
    if let Some(digest) = digest {
        let _ = verify_password(password, digest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let digest = hash_password("Secr3t!").unwrap();
        assert!(digest.starts_with("$argon2id$"));
        assert!(verify_password("Secr3t!", &digest));
    }

    #[test]
    fn test_salt_differs_per_call() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let digest = hash_password("right").unwrap();
        assert!(!verify_password("wrong", &digest));
        assert!(!verify_password("", &digest));
        assert!(!verify_password("right ", &digest));
    }

    #[test]
    fn test_malformed_digest_is_false() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", "$argon2id$v=19$garbage"));
    }

    #[test]
    fn test_dummy_verify_does_not_panic() {
        dummy_verify("whatever");
        dummy_verify("");
    }
}
