//! Login gate
//!
//! A successful credential check yields an [`AuthSession`]. Views that need a
//! logged-in user take the session by reference; logging out consumes it.
//! This is a navigation gate for a single operator, not a security boundary.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials: please check your ID and password")]
    InvalidCredentials,
}

/// The credential pair the console accepts
#[derive(Debug, Clone)]
pub struct AuthConfig {
    admin_id: String,
    password: String,
}

impl AuthConfig {
    pub fn new(admin_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            admin_id: admin_id.into(),
            password: password.into(),
        }
    }

    pub fn login(&self, id: &str, password: &str) -> Result<AuthSession, AuthError> {
        if id != self.admin_id || password != self.password {
            tracing::warn!(%id, "Rejected login");
            return Err(AuthError::InvalidCredentials);
        }
        tracing::info!(id = %self.admin_id, "Logged in");
        Ok(AuthSession {
            user_id: self.admin_id.clone(),
            started_at: Utc::now(),
        })
    }
}

/// Proof of a successful login. Only [`AuthConfig::login`] creates one.
#[derive(Debug)]
pub struct AuthSession {
    user_id: String,
    started_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// End the session, returning the user id for the farewell message
    pub fn logout(self) -> String {
        tracing::info!(id = %self.user_id, "Logged out");
        self.user_id
    }
}
