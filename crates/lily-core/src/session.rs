//! Explicit session context shared by the remote client and hosts.
//!
//! Hosts create one `SessionContext` at start-up, hand it (behind an `Arc`)
//! to the HTTP remote service, and `close()` it on shutdown.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tokens issued by the hosted auth provider
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    #[serde(default)]
    pub id_token: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl AuthTokens {
    /// Tokens from a bare access token (e.g. pasted from the web login)
    pub fn from_access_token(access_token: impl Into<String>) -> Result<Self> {
        let access_token = access_token.into().trim().to_string();
        if access_token.is_empty() {
            return Err(Error::InvalidInput("access token must not be empty".into()));
        }
        Ok(Self {
            id_token: None,
            access_token,
            refresh_token: None,
        })
    }

    /// Token to send as `Authorization: Bearer`; the API verifies id tokens first
    pub fn bearer(&self) -> &str {
        self.id_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .unwrap_or(self.access_token.as_str())
    }
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthTokens")
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    tokens: Option<AuthTokens>,
    closed: bool,
}

/// Holder of the signed-in user's tokens for the lifetime of a host process
#[derive(Debug, Default)]
pub struct SessionContext {
    state: RwLock<SessionState>,
}

impl SessionContext {
    /// New, signed-out session
    pub fn new() -> Self {
        Self::default()
    }

    /// New session already holding tokens
    pub fn with_tokens(tokens: AuthTokens) -> Self {
        Self {
            state: RwLock::new(SessionState {
                tokens: Some(tokens),
                closed: false,
            }),
        }
    }

    /// Store tokens after a login or refresh
    pub fn set_tokens(&self, tokens: AuthTokens) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            return Err(Error::InvalidInput("session has been closed".into()));
        }
        state.tokens = Some(tokens);
        Ok(())
    }

    /// Current bearer token, if signed in
    pub fn bearer_token(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.tokens.as_ref().map(|tokens| tokens.bearer().to_string())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    /// Forget tokens (sign-out); the session stays usable
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.tokens = None;
    }

    /// End the session lifecycle; later `set_tokens` calls fail
    pub fn close(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.tokens = None;
        state.closed = true;
        tracing::debug!("Session context closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }
}
