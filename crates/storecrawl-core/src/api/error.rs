use thiserror::Error;

use crate::utils::truncate_body;

/// Failures of the session layer.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Session expired")]
    Expired,

    #[error("Upstream rejected the credentials: {0}")]
    UpstreamRejected(String),

    /// The credential exchange itself failed (network, timeout, garbled reply).
    #[error("Credential exchange failed: {0}")]
    Exchange(#[source] Box<ClientError>),
}

impl AuthError {
    pub fn exchange(err: impl Into<ClientError>) -> Self {
        AuthError::Exchange(Box::new(err.into()))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Missing required field `{field}`{}", .record.as_deref().map(|r| format!(" in {}", r)).unwrap_or_default())]
    MissingRequiredField {
        field: &'static str,
        record: Option<String>,
    },

    #[error("Unexpected format: {0}")]
    UnexpectedFormat(String),
}

impl ParseError {
    pub fn missing(field: &'static str) -> Self {
        ParseError::MissingRequiredField { field, record: None }
    }

    pub fn missing_in(field: &'static str, record: impl Into<String>) -> Self {
        ParseError::MissingRequiredField {
            field,
            record: Some(record.into()),
        }
    }

    pub fn format(detail: impl Into<String>) -> Self {
        ParseError::UnexpectedFormat(detail.into())
    }
}

/// Everything a client facade call can fail with.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Auth(AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// An error message the store embedded in an otherwise well-formed reply.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Server busy, try again later: {0}")]
    ServerBusy(String),

    #[error("Transient install failure, retry: {0}")]
    Retry(String),

    #[error("No more results")]
    Exhausted,
}

impl From<AuthError> for ClientError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Exchange(inner) => *inner,
            other => ClientError::Auth(other),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Network(err)
        }
    }
}

impl ClientError {
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let truncated = truncate_body(&text);
        match status {
            401 => ClientError::Auth(AuthError::Expired),
            403 => ClientError::AccessDenied(truncated),
            404 => ClientError::NotFound(truncated),
            429 => ClientError::RateLimited,
            _ => ClientError::Status {
                status,
                body: truncated,
            },
        }
    }

    /// True when the failure is the session going stale upstream.
    pub fn is_expired(&self) -> bool {
        matches!(self, ClientError::Auth(AuthError::Expired))
    }
}
