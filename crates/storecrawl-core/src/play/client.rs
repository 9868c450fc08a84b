use std::sync::Arc;

use tracing::{debug, info, warn};

use super::auth::PlayAuthenticator;
use super::device::DeviceProfile;
use super::parse::{
    parse_app_page, parse_categories, parse_delivery, parse_details, parse_purchase,
    parse_subcategories, parse_wrapper, server_error,
};
use super::proto::ResponseWrapper;
use super::request::{PlayOperation, PlayRequestBuilder};
use crate::api::{AuthError, ClientError, HttpTransport, Params, ParseError, Transport};
use crate::auth::{Authenticator, Credentials, Session, SessionManager, SessionPhase, SessionStore};
use crate::models::{AppInfo, AppPage, Category, Delivery, Partial, SubCategory};

/// Reply text the store uses for a transient install failure.
const RETRY_MESSAGE: &str = "Can't install. Please try again later.";

/// Offer type of a free app.
const FREE_OFFER_TYPE: i32 = 1;

/// Classify an error message embedded in a purchase or delivery reply.
fn install_error(message: &str) -> ClientError {
    if message == RETRY_MESSAGE {
        ClientError::Retry(message.to_string())
    } else if message.contains("busy") {
        ClientError::ServerBusy(message.to_string())
    } else {
        ClientError::Upstream(message.to_string())
    }
}

/// Google Play client.
///
/// Every call obtains a session from the manager, sends one request and
/// parses the reply. When upstream reports the session expired, the
/// session is refreshed once and the request retried once.
pub struct PlayClient<T = HttpTransport, A = PlayAuthenticator<T>> {
    transport: Arc<T>,
    builder: PlayRequestBuilder,
    sessions: SessionManager<A>,
}

impl<T: Transport> PlayClient<T> {
    pub fn new(
        transport: T,
        device: DeviceProfile,
        locale: impl Into<String>,
        credentials: Credentials,
        session_store: Option<SessionStore>,
    ) -> Self {
        let transport = Arc::new(transport);
        let builder = PlayRequestBuilder::new(device, locale);
        let mut authenticator = PlayAuthenticator::new(transport.clone(), builder.clone());
        if let Some(store) = session_store {
            authenticator = authenticator.with_session_store(store);
        }
        Self::from_parts(transport, builder, SessionManager::new(authenticator, credentials))
    }
}

impl<T: Transport, A: Authenticator> PlayClient<T, A> {
    pub(crate) fn from_parts(
        transport: Arc<T>,
        builder: PlayRequestBuilder,
        sessions: SessionManager<A>,
    ) -> Self {
        Self {
            transport,
            builder,
            sessions,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.sessions.phase()
    }

    pub fn sessions(&self) -> &SessionManager<A> {
        &self.sessions
    }

    /// Log in now instead of on the first request.
    pub async fn login(&self) -> Result<(), ClientError> {
        self.sessions.ensure_session().await?;
        Ok(())
    }

    pub async fn logout(&self) {
        self.sessions.logout().await;
    }

    async fn send_once(
        &self,
        operation: PlayOperation,
        session: &Session,
        params: &Params,
    ) -> Result<ResponseWrapper, ClientError> {
        if session.is_expired() {
            return Err(AuthError::Expired.into());
        }
        let request = self.builder.build(operation, session, params)?;
        let response = self.transport.send(&request).await?.check()?;
        Ok(parse_wrapper(&response.body)?)
    }

    /// Send one operation, re-authenticating once if the session expired.
    async fn execute(
        &self,
        operation: PlayOperation,
        params: &Params,
    ) -> Result<ResponseWrapper, ClientError> {
        let session = self.sessions.ensure_session().await?;
        match self.send_once(operation, &session, params).await {
            Err(err) if err.is_expired() => {
                info!(operation = operation.name(), "Session expired, re-authenticating");
                let fresh = self.sessions.force_refresh(&session).await?;
                self.send_once(operation, &fresh, params).await
            }
            other => other,
        }
    }

    /// Like `execute`, but an embedded error message fails the call.
    async fn query(
        &self,
        operation: PlayOperation,
        params: &Params,
    ) -> Result<ResponseWrapper, ClientError> {
        let wrapper = self.execute(operation, params).await?;
        if let Some(message) = server_error(&wrapper) {
            warn!(operation = operation.name(), error = message, "Store returned an error");
            return Err(ClientError::Upstream(message.to_string()));
        }
        Ok(wrapper)
    }

    pub async fn fetch_details(&self, package: &str) -> Result<AppInfo, ClientError> {
        debug!(package, "Fetching details");
        let wrapper = self
            .query(PlayOperation::Details, &Params::new().with("doc", package))
            .await?;
        Ok(parse_details(&wrapper)?)
    }

    pub async fn categories(&self) -> Result<Partial<Category>, ClientError> {
        let wrapper = self.query(PlayOperation::Browse, &Params::new()).await?;
        let categories = parse_categories(&wrapper)?;
        debug!(
            count = categories.len(),
            failed = categories.errors.len(),
            "Parsed categories"
        );
        Ok(categories)
    }

    /// Listings of one category. With `free_only`, listings of paid apps
    /// are dropped.
    pub async fn subcategories(
        &self,
        category: &Category,
        free_only: bool,
    ) -> Result<Partial<SubCategory>, ClientError> {
        let wrapper = self
            .query(PlayOperation::Browse, &Params::new().with("cat", &category.id))
            .await?;
        let mut subcategories = parse_subcategories(&wrapper, category);
        if free_only {
            subcategories.records.retain(|s| !s.is_paid());
        }
        debug!(
            category = %category.id,
            count = subcategories.len(),
            "Parsed subcategories"
        );
        Ok(subcategories)
    }

    /// First page of apps listed in a subcategory.
    pub async fn discover_apps(&self, subcategory: &SubCategory) -> Result<AppPage, ClientError> {
        self.list_page(&subcategory.data_url, &subcategory.parent.id).await
    }

    /// The page following `page`; `ClientError::Exhausted` at the end.
    pub async fn next_page(&self, page: &AppPage) -> Result<AppPage, ClientError> {
        let url = page.next_page_url.as_deref().ok_or(ClientError::Exhausted)?;
        let category = page.category.as_deref().unwrap_or_default();
        let next = match self.list_page(url, category).await {
            Ok(next) => next,
            // Past the last page the store answers with an empty list.
            Err(ClientError::Parse(ParseError::MissingRequiredField { .. })) => {
                debug!(url, "List reply without apps");
                return Err(ClientError::Exhausted);
            }
            Err(err) => return Err(err),
        };
        if next.apps.is_empty() && next.errors.is_empty() {
            return Err(ClientError::Exhausted);
        }
        Ok(next)
    }

    async fn list_page(&self, url: &str, category: &str) -> Result<AppPage, ClientError> {
        let wrapper = self
            .query(PlayOperation::List, &Params::new().with("url", url))
            .await?;
        let (apps, next) = parse_app_page(&wrapper)?;
        debug!(url, count = apps.len(), failed = apps.errors.len(), "Parsed app page");
        Ok(AppPage::from_partial(
            apps,
            next,
            (!category.is_empty()).then(|| category.to_string()),
        ))
    }

    /// Purchase (free apps included) and resolve the download of `app`.
    pub async fn delivery(&self, app: &AppInfo) -> Result<Delivery, ClientError> {
        let offer_type = app.offer_type.unwrap_or(FREE_OFFER_TYPE);
        let mut params = Params::new()
            .with("doc", &app.id)
            .with("ot", offer_type.to_string())
            .with("vc", app.version_code.to_string());

        let wrapper = self.execute(PlayOperation::Purchase, &params).await?;
        if let Some(message) = server_error(&wrapper) {
            return Err(install_error(message));
        }
        params.insert("dtok", parse_purchase(&wrapper)?);

        let wrapper = self.execute(PlayOperation::Delivery, &params).await?;
        if let Some(message) = server_error(&wrapper) {
            return Err(install_error(message));
        }
        let delivery = parse_delivery(&wrapper, &app.id, app.version_code)?;
        info!(package = %app.id, splits = delivery.splits.len(), "Resolved delivery");
        Ok(delivery)
    }
}
