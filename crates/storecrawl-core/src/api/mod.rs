//! Store-independent client plumbing.
//!
//! This module provides the pieces both store clients share:
//! - `Params` / `RequestDescriptor`: the immutable output of a request builder
//! - `Transport`: the network seam, with `HttpTransport` on top of reqwest
//! - the error taxonomy (`AuthError`, `ValidationError`, `ParseError`, `ClientError`)

pub mod error;
pub mod request;
pub mod transport;

pub use error::{AuthError, ClientError, ParseError, ValidationError};
pub use request::{Body, Params, RequestDescriptor};
pub use transport::{HttpTransport, RawResponse, Transport};
