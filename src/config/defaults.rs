//! Default value functions for configuration.

use std::net::SocketAddr;

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "bookbot-auth".to_string()
}

pub fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

// =============================================================================
// Database Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "bookbot.db".to_string()
}

pub fn default_storage_timeout_secs() -> u64 {
    5
}

// =============================================================================
// Session Defaults
// =============================================================================

pub fn default_session_ttl_minutes() -> u64 {
    30
}

pub fn default_purge_interval_secs() -> u64 {
    300
}

// =============================================================================
// Dialogue Defaults
// =============================================================================

pub fn default_idle_timeout_minutes() -> u64 {
    15
}

pub fn default_sweep_interval_secs() -> u64 {
    60
}
