//! Authentication module for managing sessions and credentials.
//!
//! This module provides:
//! - `Credentials`: an account identifier and its secret, never printed
//! - `SessionManager`: caches one session per credential set and serializes refreshes
//! - `SessionStore`: persists an issued token so later runs can skip the password login
//! - `CredentialStore`: Secure OS-level password storage via keyring

pub mod credentials;
pub mod manager;
pub mod session;

pub use credentials::{CredentialStore, Credentials, IssuedToken};
pub use manager::{Authenticator, SessionManager, SessionPhase};
pub use session::{DeviceBinding, Session, SessionStore};
