// Moderation client - core logic for talking to the moderation service.
//
// This service handles:
// - Submitting prompts with the session token attached
// - Adopting refreshed session tokens
// - Falling back to the local classifier when the service is down
// - Report generation and server-side session reset
//
// The HTTP details live behind the ModerationGateway trait in infra.

use super::fallback;
use super::moderation_models::{ModerationResult, RawModerationResponse, VerdictSource};
use crate::core::session::SessionHandle;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Instant;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Failures reported by a gateway implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Errors surfaced by `submit`. Transport problems never show up here.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Malformed moderation response: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced by `generate_report`.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No active session - submit a prompt first")]
    NoActiveSession,

    #[error("Report service unreachable: {0}")]
    Unavailable(String),

    #[error("Report service returned {0}")]
    Status(u16),

    #[error("Malformed report response: {0}")]
    Malformed(String),
}

impl ReportError {
    /// Whether trying the same request again can succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ReportError::NoActiveSession)
    }
}

impl From<GatewayError> for ReportError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(msg) => ReportError::Unavailable(msg),
            GatewayError::Status { status, .. } => ReportError::Status(status),
            GatewayError::Malformed(msg) => ReportError::Malformed(msg),
        }
    }
}

// ============================================================================
// GATEWAY TRAIT (PORT)
// ============================================================================

/// Wire access to the moderation service.
#[async_trait]
pub trait ModerationGateway: Send + Sync {
    /// Classify one prompt, bound to `session_id` when one is held.
    async fn check(
        &self,
        prompt: &str,
        session_id: Option<&str>,
    ) -> Result<RawModerationResponse, GatewayError>;

    /// Fetch the server-side report for a session.
    async fn report(&self, session_id: &str) -> Result<String, GatewayError>;

    /// Invalidate a session on the server.
    async fn reset(&self, session_id: &str) -> Result<(), GatewayError>;

    /// Cheap liveness probe.
    async fn health(&self) -> Result<(), GatewayError>;
}

// Lets the client hold any gateway behind a trait object.
#[async_trait]
impl ModerationGateway for Box<dyn ModerationGateway> {
    async fn check(
        &self,
        prompt: &str,
        session_id: Option<&str>,
    ) -> Result<RawModerationResponse, GatewayError> {
        (**self).check(prompt, session_id).await
    }

    async fn report(&self, session_id: &str) -> Result<String, GatewayError> {
        (**self).report(session_id).await
    }

    async fn reset(&self, session_id: &str) -> Result<(), GatewayError> {
        (**self).reset(session_id).await
    }

    async fn health(&self) -> Result<(), GatewayError> {
        (**self).health().await
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationClient<G: ModerationGateway> {
    gateway: G,
    session: SessionHandle,
}

impl<G: ModerationGateway> ModerationClient<G> {
    pub fn new(gateway: G, session: SessionHandle) -> Self {
        Self { gateway, session }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Submit a prompt for classification.
    ///
    /// Returns `Ok(None)` for blank input without touching the network. Transport
    /// failures are answered by the local fallback classifier, so the only error is
    /// a response the service sent but we could not understand.
    pub async fn submit(&self, prompt: &str) -> Result<Option<ModerationResult>, ModerationError> {
        if prompt.trim().is_empty() {
            return Ok(None);
        }

        let (token, epoch) = self.session.current().await;
        let started = Instant::now();

        let (raw, source) = match self.gateway.check(prompt, token.as_deref()).await {
            Ok(raw) => {
                if let Some(new_token) = raw.session_id.clone() {
                    if token.as_deref() != Some(new_token.as_str())
                        && !self.session.adopt(epoch, new_token).await
                    {
                        tracing::debug!("Session was reset mid-flight, ignoring issued token");
                    }
                }
                (raw, VerdictSource::Remote)
            }
            Err(GatewayError::Malformed(msg)) => {
                tracing::error!(error = %msg, "Moderation service sent a malformed response");
                return Err(ModerationError::MalformedResponse(msg));
            }
            Err(err) => {
                tracing::warn!(error = %err, "Moderation service unavailable, using local fallback");
                (fallback::classify(prompt), VerdictSource::LocalFallback)
            }
        };

        Ok(Some(ModerationResult {
            raw,
            source,
            received_at: Utc::now(),
            response_time: started.elapsed(),
            epoch,
        }))
    }

    /// Drop the held session token and ask the service to forget it.
    ///
    /// The local token is always cleared; a failed server-side reset is only logged.
    pub async fn reset_session(&self) {
        let Some(token) = self.session.invalidate().await else {
            return;
        };

        if let Err(err) = self.gateway.reset(&token).await {
            tracing::warn!(error = %err, "Server-side session reset failed");
        }
    }

    /// Ask the service for its summary of the current session.
    pub async fn generate_report(&self) -> Result<String, ReportError> {
        let token = self
            .session
            .token()
            .await
            .ok_or(ReportError::NoActiveSession)?;

        self.gateway.report(&token).await.map_err(|err| {
            tracing::error!(error = %err, "Report generation failed");
            ReportError::from(err)
        })
    }

    pub async fn is_reachable(&self) -> bool {
        self.gateway.health().await.is_ok()
    }
}

// ============================================================================
// TESTS
// ============================================================================
