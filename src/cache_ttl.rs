//! Centralized TTL constants for caching
//!
//! Portal sessions are short-lived; the TTL can be overridden through the
//! environment when a portal tenant is configured differently.

use std::env;
use std::time::Duration;

// Default TTL constants (in seconds)
pub const TTL_PORTAL_SESSION: u64 = 300; // 5 minutes

/// Get TTL with environment variable override
pub fn ttl_with_env(env_key: &str, default_ttl: u64) -> u64 {
    env::var(env_key)
        .map(|val| val.parse::<u64>().unwrap_or(default_ttl))
        .unwrap_or(default_ttl)
}

/// Get portal session TTL from environment or default
pub fn get_session_ttl() -> Duration {
    Duration::from_secs(ttl_with_env("SESSION_TTL_SECONDS", TTL_PORTAL_SESSION))
}
