//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("session.ttl_minutes must be greater than zero")]
    ZeroSessionTtl,
    #[error("session.purge_interval_secs must be greater than zero")]
    ZeroPurgeInterval,
    #[error("database.storage_timeout_secs must be greater than zero")]
    ZeroStorageTimeout,
    #[error("dialogue.idle_timeout_minutes must be greater than zero")]
    ZeroIdleTimeout,
    #[error("dialogue.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.session.ttl_minutes == 0 {
        errors.push(ValidationError::ZeroSessionTtl);
    }
    if config.session.purge_interval_secs == 0 {
        errors.push(ValidationError::ZeroPurgeInterval);
    }
    if config.database.storage_timeout_secs == 0 {
        errors.push(ValidationError::ZeroStorageTimeout);
    }
    if config.dialogue.idle_timeout_minutes == 0 {
        errors.push(ValidationError::ZeroIdleTimeout);
    }
    if config.dialogue.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    // Database path validation
    let db = &config.database;
    if db.path != ":memory:" {
        let db_path = Path::new(&db.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
