//! Store-independent request types shared by the request builders.

use std::collections::BTreeMap;
use std::fmt;

use reqwest::Method;

use super::ValidationError;

/// Logical parameters for an operation, kept ordered so that building
/// the same operation twice yields the same descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<&'static str, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.insert(key, value.into());
        self
    }

    pub fn insert(&mut self, key: &'static str, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Key order is stable, so equal params give equal bodies.
    pub(crate) fn to_form(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    /// Fetch a required parameter, treating blank values as missing.
    pub fn require(&self, key: &'static str) -> Result<&str, ValidationError> {
        match self.get(key).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ValidationError::MissingField(key)),
        }
    }

    /// Fetch a required parameter and parse it as an unsigned integer.
    pub fn require_u64(&self, key: &'static str) -> Result<u64, ValidationError> {
        let raw = self.require(key)?;
        raw.parse().map_err(|_| ValidationError::InvalidValue {
            field: key,
            reason: format!("expected an unsigned integer, got {:?}", raw),
        })
    }
}

/// Validate an Android package name (`com.example.app`).
pub fn validate_package_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field,
            reason: format!("{:?} is not a valid package name", value),
        })
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Body {
    Form(Vec<(String, String)>),
    Protobuf(Vec<u8>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Form bodies carry login secrets; only their shape is printable.
        match self {
            Body::Form(fields) => f
                .debug_tuple("Form")
                .field(&fields.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>())
                .finish(),
            Body::Protobuf(bytes) => write!(f, "Protobuf({} bytes)", bytes.len()),
        }
    }
}

/// A fully built, immutable request ready for the transport.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    operation: &'static str,
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    authenticated: bool,
}

impl RequestDescriptor {
    pub(crate) fn new(operation: &'static str, method: Method, url: impl Into<String>) -> Self {
        Self {
            operation,
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            authenticated: false,
        }
    }

    pub(crate) fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub(crate) fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub(crate) fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub(crate) fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Mark the descriptor as bound to a session.
    pub(crate) fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn header_pairs(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn payload(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("authorization") {
                    (k.as_str(), "<redacted>")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("RequestDescriptor")
            .field("operation", &self.operation)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &headers)
            .field("body", &self.body)
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_treats_blank_as_missing() {
        let params = Params::new().with("doc", "  ");
        assert_eq!(params.require("doc"), Err(ValidationError::MissingField("doc")));
        assert_eq!(params.require("other"), Err(ValidationError::MissingField("other")));
    }

    #[test]
    fn test_require_u64() {
        let params = Params::new().with("vc", "42").with("ot", "one");
        assert_eq!(params.require_u64("vc"), Ok(42));
        assert!(matches!(
            params.require_u64("ot"),
            Err(ValidationError::InvalidValue { field: "ot", .. })
        ));
    }

    #[test]
    fn test_validate_package_name() {
        assert!(validate_package_name("doc", "com.example.app").is_ok());
        assert!(validate_package_name("doc", "org.fossify.gallery_2").is_ok());
        assert!(validate_package_name("doc", "").is_err());
        assert!(validate_package_name("doc", "com..app").is_err());
        assert!(validate_package_name("doc", "com.1app").is_err());
        assert!(validate_package_name("doc", "../etc/passwd").is_err());
    }

    #[test]
    fn test_debug_redacts_authorization_and_form_values() {
        let request = RequestDescriptor::new("details", Method::GET, "https://example.org")
            .header("Authorization", "GoogleLogin auth=secret-token")
            .body(Body::Form(vec![("EncryptedPasswd".into(), "hunter2".into())]));
        let printed = format!("{:?}", request);
        assert!(!printed.contains("secret-token"));
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("EncryptedPasswd"));
    }
}
