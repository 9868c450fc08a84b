//! Unofficial clients for the Google Play and F-Droid catalogues.
//!
//! Both stores are crawled through the same `AppStore` operations:
//! fetch one app, walk categories, discover apps page by page. Google Play
//! needs an authenticated session (see `auth`); F-Droid is scraped from its
//! public website.

pub mod api;
pub mod auth;
pub mod config;
pub mod fdroid;
pub mod models;
pub mod play;
pub mod store;
pub mod utils;

pub use api::{AuthError, ClientError, HttpTransport, ParseError, Transport, ValidationError};
pub use auth::{CredentialStore, Credentials, IssuedToken, SessionManager, SessionPhase, SessionStore};
pub use config::Config;
pub use fdroid::FDroidClient;
pub use models::{AppInfo, AppPage, Category, Delivery, ItemError, Partial, Store, SubCategory};
pub use play::{DeviceProfile, PlayClient};
pub use store::AppStore;
