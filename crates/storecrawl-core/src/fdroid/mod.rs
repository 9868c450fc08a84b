//! F-Droid client parsing the public f-droid.org website.
//!
//! - `FDroidRequestBuilder`: site URLs per `FDroidOperation`
//! - `parse`: package, package-index and category pages
//! - `FDroidClient`: the facade; discovery fetches package pages concurrently

pub mod client;
pub mod parse;
pub mod request;

pub use client::{FDroidClient, DEFAULT_CONCURRENCY, ROOT_CATEGORY};
pub use request::{FDroidOperation, FDroidRequestBuilder, FDROID_BASE};
