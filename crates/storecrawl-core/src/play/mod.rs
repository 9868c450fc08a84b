//! Google Play client speaking the private `fdfe` protobuf protocol.
//!
//! - `PlayRequestBuilder`: headers and parameters per `PlayOperation`
//! - `PlayAuthenticator`: token or password login, device checkin
//! - `parse`: protobuf replies into `AppInfo`, categories, deliveries
//! - `PlayClient`: the facade tying them together

pub mod auth;
pub mod client;
pub mod crypto;
pub mod device;
pub mod parse;
pub mod proto;
pub mod request;

pub use auth::PlayAuthenticator;
pub use client::PlayClient;
pub use device::{DeviceProfile, DEFAULT_DEVICE};
pub use request::{PlayOperation, PlayRequestBuilder};
