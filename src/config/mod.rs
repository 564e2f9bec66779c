//! Configuration loading and management.
//!
//! - [`types`]: config struct definitions and TOML loading
//! - [`defaults`]: serde default values
//! - [`validation`]: startup checks that report every problem at once

mod defaults;
mod types;
mod validation;

pub use types::{Config, ConfigError, DatabaseConfig, DialogueConfig, ServerConfig, SessionConfig};
pub use validation::{ValidationError, validate};
