//! Bearer credential for the rendering service.
//!
//! The store starts `Absent` and moves to `Present` at most once. There is no
//! way back to `Absent`.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("token must not be empty")]
    Empty,

    #[error("a credential is already present")]
    AlreadyPresent,
}

/// An opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    /// Attach this credential to an outgoing request.
    pub fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        request.header("Authorization", self.bearer())
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Holds zero or one credential.
#[derive(Debug, Default)]
pub struct CredentialStore {
    token: RwLock<Option<Credential>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `token`.
    pub fn with_token(token: &str) -> Result<Self, CredentialError> {
        let store = Self::new();
        store.install(token)?;
        Ok(store)
    }

    pub fn has_credential(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn current(&self) -> Option<Credential> {
        self.token.read().clone()
    }

    /// Transition `Absent -> Present`.
    pub fn install(&self, token: &str) -> Result<(), CredentialError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::Empty);
        }

        let mut slot = self.token.write();
        if slot.is_some() {
            return Err(CredentialError::AlreadyPresent);
        }
        *slot = Some(Credential::new(token));
        crate::debug!("auth"; "credential installed");
        Ok(())
    }
}
