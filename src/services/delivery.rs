use crate::models::NormalizedDocument;
use async_trait::async_trait;
use serde::Serialize;
use shared::{Result, ScraperError};
use std::env;
use std::io::Write;
use tracing::{info, warn};

// ============================================================================
// DOCUMENT SINK
// ============================================================================

#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn deliver(&self, document: &NormalizedDocument) -> Result<()>;
}

/// Writes each document as one JSON line on stdout.
#[derive(Debug, Default)]
pub struct StdoutSink;

#[async_trait]
impl DocumentSink for StdoutSink {
    async fn deliver(&self, document: &NormalizedDocument) -> Result<()> {
        let line = serde_json::to_string(document)?;
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", line).map_err(|e| ScraperError::Delivery {
            message: format!("failed to write document {}: {}", document.id, e),
        })
    }
}

// ============================================================================
// AUTHENTICATION EVENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthOutcome {
    Success,
    Failure,
}

/// Lifecycle event published after every login attempt outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthEvent {
    pub job_id: Option<String>,
    pub portal_id: Option<String>,
    pub portal_user_id: String,
    pub auth_event: AuthOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
}

#[async_trait]
pub trait AuthEventNotifier: Send + Sync {
    async fn authentication_succeeded(&self, event: &AuthEvent) -> Result<()>;
    async fn authentication_failed(&self, event: &AuthEvent) -> Result<()>;
}

/// Publishes auth events as structured log records.
#[derive(Debug, Default)]
pub struct TracingNotifier {
    event_bus: Option<String>,
}

impl TracingNotifier {
    pub fn new(event_bus: Option<String>) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl AuthEventNotifier for TracingNotifier {
    async fn authentication_succeeded(&self, event: &AuthEvent) -> Result<()> {
        let detail = serde_json::to_string(event)?;
        info!(
            event_bus = self.event_bus.as_deref().unwrap_or("default"),
            detail = %detail,
            "🔓 Authentication succeeded"
        );
        Ok(())
    }

    async fn authentication_failed(&self, event: &AuthEvent) -> Result<()> {
        let detail = serde_json::to_string(event)?;
        warn!(
            event_bus = self.event_bus.as_deref().unwrap_or("default"),
            detail = %detail,
            "🔒 Authentication failed"
        );
        Ok(())
    }
}

// ============================================================================
// PASSWORD RESOLUTION
// ============================================================================

#[async_trait]
pub trait PasswordResolver: Send + Sync {
    async fn resolve(&self, key: &str) -> Result<String>;
}

/// Reads the password from the environment variable named by the key.
#[derive(Debug, Default)]
pub struct EnvPasswordResolver;

#[async_trait]
impl PasswordResolver for EnvPasswordResolver {
    async fn resolve(&self, key: &str) -> Result<String> {
        env::var(key)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ScraperError::configuration(format!("password for key {} is not available", key)))
    }
}
