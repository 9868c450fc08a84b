use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::IssuedToken;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Buffer time before expiry to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

/// Device identity a Google Play session is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceBinding {
    pub android_id: Option<u64>,
    pub device_config_token: Option<String>,
    pub checkin_consistency_token: Option<String>,
}

/// A short-lived authenticated context derived from credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    expires_at: DateTime<Utc>,
    binding: DeviceBinding,
}

impl Session {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
            binding: DeviceBinding::default(),
        }
    }

    pub fn with_binding(mut self, binding: DeviceBinding) -> Self {
        self.binding = binding;
        self
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn binding(&self) -> &DeviceBinding {
        &self.binding
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check if the session will expire soon and should be refreshed
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES) >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_minutes().max(0)
    }

    pub(crate) fn same_token(&self, other: &Session) -> bool {
        self.token == other.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("binding", &self.binding)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    identifier: String,
    token: IssuedToken,
    saved_at: DateTime<Utc>,
}

/// Persists the issued Google Play token so later processes can log in
/// without spending a password login.
#[derive(Debug, Clone)]
pub struct SessionStore {
    cache_dir: PathBuf,
}

impl SessionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Load the token saved for `identifier`, if any
    pub fn load(&self, identifier: &str) -> Result<Option<IssuedToken>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read session file")?;
        let stored: StoredSession = serde_json::from_str(&contents)
            .context("Failed to parse session file")?;

        if stored.identifier == identifier {
            Ok(Some(stored.token))
        } else {
            Ok(None)
        }
    }

    /// Save session to disk
    pub fn save(&self, identifier: &str, token: &IssuedToken) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredSession {
            identifier: identifier.to_string(),
            token: token.clone(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict session file permissions")?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}
