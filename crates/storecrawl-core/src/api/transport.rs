//! The network seam: every store client talks to upstream through a
//! `Transport`, so tests can replay canned responses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::request::{Body, RequestDescriptor};
use super::ClientError;

/// Connect timeout; the overall request timeout comes from the caller.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Raw upstream reply before any store-specific decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn ok(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            url: url.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Return the response if successful, or the matching error.
    pub fn check(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::from_status(self.status, &self.body))
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, ClientError>;
}

/// `reqwest`-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, ClientError> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url());
        if !request.query_params().is_empty() {
            builder = builder.query(request.query_params());
        }
        for (name, value) in request.header_pairs() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.payload() {
            Some(Body::Form(fields)) => builder.form(fields),
            Some(Body::Protobuf(bytes)) => builder.body(bytes.clone()),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.bytes().await?.to_vec();
        debug!(
            operation = request.operation(),
            status,
            bytes = body.len(),
            "Upstream response received"
        );

        Ok(RawResponse { status, url, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for unit tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    type Reply = Result<RawResponse, ClientError>;

    /// Replays queued replies in order and records every request it saw.
    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        seen: Mutex<Vec<RequestDescriptor>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, reply: Reply) -> &Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        pub fn push_ok(&self, url: &str, body: impl Into<Vec<u8>>) -> &Self {
            self.push(Ok(RawResponse::ok(url, body)))
        }

        pub fn push_status(&self, status: u16) -> &Self {
            self.push(Ok(RawResponse {
                status,
                url: String::new(),
                body: Vec::new(),
            }))
        }

        pub fn requests(&self) -> Vec<RequestDescriptor> {
            self.seen.lock().unwrap().clone()
        }

        pub fn request_count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, ClientError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("no scripted reply for {:?}", request.url()))
        }
    }
}
