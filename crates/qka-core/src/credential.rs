//! Shared-secret credential provider
//!
//! The gateway authenticates every call against one process-wide secret. The
//! secret is either supplied explicitly or derived deterministically from a
//! stable machine identifier, so restarting without configuration always
//! yields the same token. There is no expiry, rotation, or per-client scope.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Files probed, in order, for a stable machine identifier
const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential secret must not be empty")]
    Empty,

    #[error("no stable machine identifier available; supply an explicit token")]
    MachineIdUnavailable,
}

/// The shared secret
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Result<Self, CredentialError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(Self(secret))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare a presented value against the secret in constant time
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Source of the token requests are checked against.
///
/// The value is fixed for the lifetime of the process.
pub trait CredentialProvider: Send + Sync {
    fn current_token(&self) -> &Credential;

    /// Short name of the strategy, for logging
    fn strategy(&self) -> &'static str;
}

/// Explicit caller-supplied secret
#[derive(Debug, Clone)]
pub struct StaticCredential {
    credential: Credential,
}

impl StaticCredential {
    pub fn new(secret: impl Into<String>) -> Result<Self, CredentialError> {
        Ok(Self {
            credential: Credential::new(secret)?,
        })
    }
}

impl CredentialProvider for StaticCredential {
    fn current_token(&self) -> &Credential {
        &self.credential
    }

    fn strategy(&self) -> &'static str {
        "static"
    }
}

/// SHA-256 hex digest of a stable machine identifier
#[derive(Debug, Clone)]
pub struct MachineCredential {
    credential: Credential,
}

impl MachineCredential {
    /// Derive the token from this host's machine identifier
    pub fn derive() -> Result<Self, CredentialError> {
        let id = machine_identifier().ok_or(CredentialError::MachineIdUnavailable)?;
        Ok(Self::from_identifier(&id))
    }

    /// Derive the token from a given identifier
    pub fn from_identifier(identifier: &str) -> Self {
        let digest = Sha256::digest(identifier.trim().as_bytes());
        Self {
            credential: Credential(hex::encode(digest)),
        }
    }
}

impl CredentialProvider for MachineCredential {
    fn current_token(&self) -> &Credential {
        &self.credential
    }

    fn strategy(&self) -> &'static str {
        "machine"
    }
}

fn machine_identifier() -> Option<String> {
    for path in MACHINE_ID_PATHS {
        if let Ok(content) = std::fs::read_to_string(path) {
            let id = content.trim();
            if !id.is_empty() {
                tracing::debug!(source = %path, "Using machine identifier");
                return Some(id.to_string());
            }
        }
    }
    std::env::var("HOSTNAME")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}

/// Pick the credential strategy: explicit secret when configured and non-empty,
/// otherwise machine derivation.
pub fn credential_from_config(
    secret: Option<String>,
) -> Result<Arc<dyn CredentialProvider>, CredentialError> {
    match secret.filter(|s| !s.is_empty()) {
        Some(secret) => Ok(Arc::new(StaticCredential::new(secret)?)),
        None => Ok(Arc::new(MachineCredential::derive()?)),
    }
}
