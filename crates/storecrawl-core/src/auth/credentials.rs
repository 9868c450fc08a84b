use std::fmt;

use anyhow::{Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};

use crate::api::AuthError;

const SERVICE_NAME: &str = "storecrawl";

/// An account identifier plus its secret.
///
/// Owned by a `SessionManager`; the secret is never printed.
#[derive(Clone)]
pub struct Credentials {
    identifier: String,
    secret: String,
    token: Option<IssuedToken>,
}

/// A token the store issued earlier, reusable instead of a password login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub android_id: u64,
    pub(crate) auth_token: String,
}

impl IssuedToken {
    pub fn new(android_id: u64, auth_token: impl Into<String>) -> Self {
        Self {
            android_id,
            auth_token: auth_token.into(),
        }
    }
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("android_id", &format_args!("{:x}", self.android_id))
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            token: None,
        }
    }

    /// Attach a previously issued token to try before the secret.
    pub fn with_token(mut self, token: IssuedToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }

    pub fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }

    pub fn token(&self) -> Option<&IssuedToken> {
        self.token.as_ref()
    }

    /// Drop the attached token if it is the one upstream just refused.
    pub(crate) fn forget_token(&mut self, auth_token: &str) {
        if self.token.as_ref().is_some_and(|t| t.auth_token == auth_token) {
            self.token = None;
        }
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.identifier.trim().is_empty() {
            return Err(AuthError::InvalidCredentials("identifier is empty".into()));
        }
        if self.secret.is_empty() && self.token.is_none() {
            return Err(AuthError::InvalidCredentials(
                "neither a secret nor an issued token was supplied".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .field("token", &self.token)
            .finish()
    }
}

/// OS keychain storage for account passwords.
pub struct CredentialStore;

impl CredentialStore {
    /// Store an account password in the OS keychain
    pub fn store(identifier: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, identifier)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Retrieve the password for an account from the OS keychain
    pub fn get_password(identifier: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, identifier)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Delete stored credentials for an account
    pub fn delete(identifier: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, identifier)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    /// Check if credentials exist for an account
    pub fn has_credentials(identifier: &str) -> bool {
        if let Ok(entry) = Entry::new(SERVICE_NAME, identifier) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }
}
