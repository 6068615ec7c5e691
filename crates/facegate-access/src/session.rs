//! Session issuance after a successful match.
//!
//! Credential format is an external concern; the coordinator only needs
//! something that turns a resolved identity into a bearer credential.

use crate::error::{AccessError, Result};
use chrono::{DateTime, Duration, Utc};
use facegate_core::constants::DEFAULT_SESSION_TTL_HOURS;
use facegate_core::{Identity, IdentityId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bearer credential handed back to an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredential {
    pub token: String,
    pub identity_id: IdentityId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionCredential {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Issues credentials for resolved identities.
pub trait SessionIssuer: Send + Sync {
    fn issue(&self, identity: &Identity) -> Result<SessionCredential>;
}

/// Session lifetime configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }
}

impl SessionConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// # Errors
    /// Returns `AccessError::InvalidInput` for a non-positive lifetime.
    pub fn validate(&self) -> Result<()> {
        if self.ttl <= Duration::zero() {
            return Err(AccessError::invalid_input(
                "Session lifetime must be positive",
            ));
        }
        Ok(())
    }
}

/// Mints random opaque tokens. Tokens carry no claims; whoever stores them
/// maps them back to the identity.
#[derive(Debug, Clone, Default)]
pub struct OpaqueTokenIssuer {
    config: SessionConfig,
}

impl OpaqueTokenIssuer {
    /// # Errors
    /// Returns `AccessError::InvalidInput` if the configuration is invalid.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }
}

impl SessionIssuer for OpaqueTokenIssuer {
    fn issue(&self, identity: &Identity) -> Result<SessionCredential> {
        let issued_at = Utc::now();
        Ok(SessionCredential {
            token: Uuid::new_v4().simple().to_string(),
            identity_id: identity.id.clone(),
            issued_at,
            expires_at: issued_at + self.config.ttl,
        })
    }
}
