//! Google account login for the Play Store.
//!
//! A previously issued token is tried first and validated against the
//! landing page. Otherwise the full password login runs:
//!
//! 1. `auth` for service `ac2dm` with the encrypted password
//! 2. two device checkins, yielding the android id
//! 3. `auth` for service `androidmarket` (master token), then again with
//!    that token (auth token)
//! 4. `uploadDeviceConfig`, yielding the device-config token

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use prost::Message;
use tracing::{debug, info, warn};

use super::crypto::encrypt_password;
use super::parse::{
    auth_token, parse_auth_response, parse_checkin, parse_device_config_token, parse_wrapper,
    server_error,
};
use super::proto::{AndroidCheckinRequest, UploadDeviceConfigRequest};
use super::request::{PlayOperation, PlayRequestBuilder};
use crate::api::{AuthError, ClientError, Params, ParseError, RequestDescriptor, Transport};
use crate::auth::{Authenticator, Credentials, DeviceBinding, IssuedToken, Session, SessionStore};

const LOGIN_SIGNATURE: &str = "38918a453d07199354f8b19af05ec6562ced5788";
const GMS_PACKAGE: &str = "com.google.android.gms";
const VENDING_PACKAGE: &str = "com.android.vending";
const CHECKIN_VERSION: i32 = 3;

/// Auth replies rarely carry `Expiry`; assume this lifetime when absent.
const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

fn into_auth(err: ClientError) -> AuthError {
    match err {
        ClientError::Auth(auth) => auth,
        other => AuthError::exchange(other),
    }
}

fn default_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS)
}

fn expiry(fields: &HashMap<String, String>) -> DateTime<Utc> {
    fields
        .get("expiry")
        .and_then(|raw| raw.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(default_expiry)
}

/// Exchanges Google account credentials for a Play Store session.
pub struct PlayAuthenticator<T> {
    transport: Arc<T>,
    builder: PlayRequestBuilder,
    store: Option<SessionStore>,
}

impl<T: Transport> PlayAuthenticator<T> {
    pub fn new(transport: Arc<T>, builder: PlayRequestBuilder) -> Self {
        Self {
            transport,
            builder,
            store: None,
        }
    }

    /// Persist issued tokens so later processes can skip the password login.
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    fn stored_token(&self, identifier: &str) -> Option<IssuedToken> {
        let store = self.store.as_ref()?;
        match store.load(identifier) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }

    fn save_token(&self, identifier: &str, token: &IssuedToken) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(identifier, token) {
                warn!(error = %e, "Failed to persist session");
            }
        }
    }

    fn forget_stored_token(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                warn!(error = %e, "Failed to remove rejected session");
            }
        }
    }

    async fn send(&self, request: &RequestDescriptor) -> Result<Vec<u8>, AuthError> {
        let response = self.transport.send(request).await.map_err(into_auth)?;
        Ok(response.check().map_err(into_auth)?.body)
    }

    /// Check a reused token against the landing page.
    async fn login_via_token(&self, token: &IssuedToken) -> Result<Session, AuthError> {
        let session = Session::new(token.auth_token.clone(), default_expiry()).with_binding(
            DeviceBinding {
                android_id: Some(token.android_id),
                ..DeviceBinding::default()
            },
        );
        let request = self
            .builder
            .build(PlayOperation::Home, &session, &Params::new())
            .map_err(AuthError::exchange)?;

        let body = self.send(&request).await?;
        let wrapper = parse_wrapper(&body).map_err(AuthError::exchange)?;
        if let Some(message) = server_error(&wrapper) {
            return Err(AuthError::UpstreamRejected(message.to_string()));
        }
        Ok(session)
    }

    async fn login_via_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let email = credentials.identifier();
        let encrypted =
            encrypt_password(email, credentials.secret()).map_err(AuthError::exchange)?;
        let mut form = self.login_form(email, &encrypted);

        let reply = self.auth(&form, GMS_PACKAGE, None).await?;
        let ac2dm = auth_token(&reply, "auth")?;
        debug!("Received ac2dm token");

        let mut binding = self.checkin(email, &ac2dm).await?;
        let android_id = binding.android_id;

        form.insert("app", VENDING_PACKAGE);
        form.insert("service", "androidmarket");
        let reply = self.auth(&form, VENDING_PACKAGE, android_id).await?;
        let master = auth_token(&reply, "token")?;

        form.insert("Token", master);
        form.insert("check_email", "1");
        form.insert("token_request_options", "CAA4AQ==");
        form.insert("system_partition", "1");
        form.insert("_opt_is_called_from_account_manager", "1");
        form.remove("Email");
        form.remove("EncryptedPasswd");
        let reply = self.auth(&form, VENDING_PACKAGE, android_id).await?;
        let token = auth_token(&reply, "auth")?;
        let expires_at = expiry(&reply);
        info!("Authorized device with Google Play");

        binding.device_config_token = self.upload_device_config(&binding, &token).await?;
        Ok(Session::new(token, expires_at).with_binding(binding))
    }

    fn login_form(&self, email: &str, encrypted_password: &str) -> Params {
        let locale = self.builder.locale();
        let country = locale
            .split_once('_')
            .map(|(_, country)| country.to_lowercase())
            .unwrap_or_else(|| "us".to_string());
        Params::new()
            .with("Email", email)
            .with("EncryptedPasswd", encrypted_password)
            .with("add_account", "1")
            .with("accountType", "HOSTED_OR_GOOGLE")
            .with(
                "google_play_services_version",
                self.builder.device().gsf_version.to_string(),
            )
            .with("has_permission", "1")
            .with("source", "android")
            .with("device_country", country)
            .with("lang", locale)
            .with("client_sig", LOGIN_SIGNATURE)
            .with("callerSig", LOGIN_SIGNATURE)
            .with("service", "ac2dm")
            .with("callerPkg", GMS_PACKAGE)
    }

    async fn auth(
        &self,
        form: &Params,
        app: &str,
        android_id: Option<u64>,
    ) -> Result<HashMap<String, String>, AuthError> {
        let request = self.builder.auth_request(form.to_form(), app, android_id);
        let response = self.transport.send(&request).await.map_err(into_auth)?;
        let text = response.text();
        // The login endpoint answers refusals with 403 and an `Error=` body.
        if !response.is_success() && !text.contains("Error=") {
            return Err(into_auth(ClientError::from_status(
                response.status,
                &response.body,
            )));
        }
        parse_auth_response(&text)
    }

    async fn checkin(&self, email: &str, ac2dm: &str) -> Result<DeviceBinding, AuthError> {
        let device = self.builder.device();
        let mut request = AndroidCheckinRequest {
            id: Some(0),
            checkin: Some(device.checkin()),
            locale: Some(self.builder.locale().to_string()),
            time_zone: Some("UTC".into()),
            version: Some(CHECKIN_VERSION),
            device_configuration: Some(device.device_configuration()),
            fragment: Some(0),
            ..AndroidCheckinRequest::default()
        };

        let unbound = DeviceBinding::default();
        let body = self
            .send(&self.builder.checkin_request(request.encode_to_vec(), &unbound))
            .await?;
        let response = parse_checkin(&body).map_err(AuthError::exchange)?;
        let android_id = response
            .android_id
            .filter(|id| *id != 0)
            .ok_or_else(|| AuthError::exchange(ParseError::missing("androidId")))?;

        // Second checkin binds the account to the new android id.
        request.id = Some(android_id as i64);
        request.security_token = response.security_token;
        request.account_cookie = vec![format!("[{}]", email), ac2dm.to_string()];
        self.send(&self.builder.checkin_request(request.encode_to_vec(), &unbound))
            .await?;
        info!(android_id = %format_args!("{:x}", android_id), "Device checked in");

        Ok(DeviceBinding {
            android_id: Some(android_id),
            device_config_token: None,
            checkin_consistency_token: response
                .device_checkin_consistency_token
                .filter(|t| !t.is_empty()),
        })
    }

    async fn upload_device_config(
        &self,
        binding: &DeviceBinding,
        token: &str,
    ) -> Result<Option<String>, AuthError> {
        let upload = UploadDeviceConfigRequest {
            device_configuration: Some(self.builder.device().device_configuration()),
        };
        let request =
            self.builder
                .upload_device_config_request(upload.encode_to_vec(), binding, token);
        let body = self.send(&request).await?;
        let wrapper = parse_wrapper(&body).map_err(AuthError::exchange)?;
        debug!(
            device = %self.builder.device().user_readable_name,
            "Uploaded device configuration"
        );
        Ok(parse_device_config_token(&wrapper))
    }
}

impl<T: Transport> PlayAuthenticator<T> {
    /// Token login when a reusable token other than `refused` exists,
    /// otherwise password login.
    async fn login(
        &self,
        credentials: &Credentials,
        refused: Option<&str>,
    ) -> Result<Session, AuthError> {
        let identifier = credentials.identifier();
        let usable = |token: &IssuedToken| refused != Some(token.auth_token.as_str());
        let reusable = credentials
            .token()
            .filter(|t| usable(t))
            .cloned()
            .or_else(|| self.stored_token(identifier).filter(|t| usable(t)));

        if let Some(token) = reusable {
            match self.login_via_token(&token).await {
                Ok(session) => {
                    info!("Logged in via token");
                    return Ok(session);
                }
                Err(err) => {
                    if matches!(err, AuthError::UpstreamRejected(_) | AuthError::Expired) {
                        self.forget_stored_token();
                    }
                    if !credentials.has_secret() {
                        return Err(err);
                    }
                    warn!(error = %err, "Token login failed, trying password login");
                }
            }
        } else if !credentials.has_secret() {
            return Err(AuthError::InvalidCredentials(
                "the issued token was refused and no secret is available".into(),
            ));
        }

        let session = self.login_via_password(credentials).await?;
        if let Some(android_id) = session.binding().android_id {
            self.save_token(identifier, &IssuedToken::new(android_id, session.token()));
        }
        info!("Logged in via password");
        Ok(session)
    }
}

#[async_trait]
impl<T: Transport> Authenticator for PlayAuthenticator<T> {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        self.login(credentials, None).await
    }

    async fn refresh(&self, credentials: &Credentials, stale: &Session) -> Result<Session, AuthError> {
        let refused = stale.token();
        if self
            .stored_token(credentials.identifier())
            .is_some_and(|t| t.auth_token == refused)
        {
            debug!("Dropping the refused token from the session file");
            self.forget_stored_token();
        }
        self.login(credentials, Some(refused)).await
    }
}
