//! Request construction for the Play Store `fdfe` API.

use reqwest::Method;
use url::Url;

use super::device::DeviceProfile;
use crate::api::request::validate_package_name;
use crate::api::{Body, Params, RequestDescriptor, ValidationError};
use crate::auth::{DeviceBinding, Session};

pub const FDFE_BASE: &str = "https://android.clients.google.com/fdfe/";
pub const AUTH_URL: &str = "https://android.clients.google.com/auth";
pub const CHECKIN_URL: &str = "https://android.clients.google.com/checkin";

const CLIENT_ID: &str = "am-android-google";
const NETWORK_TYPE: &str = "4";
const ENABLED_EXPERIMENTS: &str = "cl:billing.select_add_instrument_by_default";
const UNSUPPORTED_EXPERIMENTS: &str = "nocache:billing.use_charging_poller,market_emails,\
    buyer_currency,prod_baseline,checkin.set_asset_paid_app_field,shekel_test,content_ratings,\
    buyer_currency_in_app,nocache:encrypted_apk,recent_changes";

/// A logical Play Store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOperation {
    /// Landing page; used to check that a reused token is still accepted.
    Home,
    Details,
    Browse,
    List,
    Purchase,
    Delivery,
}

impl PlayOperation {
    pub fn name(self) -> &'static str {
        match self {
            PlayOperation::Home => "home",
            PlayOperation::Details => "details",
            PlayOperation::Browse => "browse",
            PlayOperation::List => "list",
            PlayOperation::Purchase => "purchase",
            PlayOperation::Delivery => "delivery",
        }
    }

    /// Parameters the operation cannot be built without.
    pub fn required(self) -> &'static [&'static str] {
        match self {
            PlayOperation::Home | PlayOperation::Browse => &[],
            PlayOperation::Details => &["doc"],
            PlayOperation::List => &["url"],
            PlayOperation::Purchase => &["doc", "ot", "vc"],
            PlayOperation::Delivery => &["doc", "ot", "vc", "dtok"],
        }
    }
}

/// Builds protocol-correct requests for one emulated device.
#[derive(Debug, Clone)]
pub struct PlayRequestBuilder {
    device: DeviceProfile,
    locale: String,
}

impl PlayRequestBuilder {
    pub fn new(device: DeviceProfile, locale: impl Into<String>) -> Self {
        Self {
            device,
            locale: locale.into(),
        }
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn build(
        &self,
        operation: PlayOperation,
        session: &Session,
        params: &Params,
    ) -> Result<RequestDescriptor, ValidationError> {
        for field in operation.required() {
            params.require(field)?;
        }

        let headers = self.base_headers(session.binding(), Some(session.token()));
        let name = operation.name();
        let request = match operation {
            PlayOperation::Home => {
                RequestDescriptor::new(name, Method::GET, format!("{}homeV2", FDFE_BASE))
                    .query("c", "3")
                    .query("nocache_isui", "true")
            }
            PlayOperation::Details => {
                let doc = params.require("doc")?;
                validate_package_name("doc", doc)?;
                RequestDescriptor::new(name, Method::GET, format!("{}details", FDFE_BASE))
                    .query("doc", doc)
            }
            PlayOperation::Browse => {
                let request =
                    RequestDescriptor::new(name, Method::GET, format!("{}browse", FDFE_BASE))
                        .query("c", "3");
                match params.get("cat").map(str::trim) {
                    Some(cat) if !cat.is_empty() => request.query("cat", cat),
                    _ => request,
                }
            }
            PlayOperation::List => {
                let url = resolve_store_url(params.require("url")?)?;
                RequestDescriptor::new(name, Method::GET, url)
            }
            PlayOperation::Purchase => {
                let (doc, offer_type, version_code) = Self::offer_params(params)?;
                RequestDescriptor::new(name, Method::POST, format!("{}purchase", FDFE_BASE)).body(
                    Body::Form(vec![
                        ("ot".into(), offer_type.to_string()),
                        ("doc".into(), doc.to_string()),
                        ("vc".into(), version_code.to_string()),
                    ]),
                )
            }
            PlayOperation::Delivery => {
                let (doc, offer_type, version_code) = Self::offer_params(params)?;
                RequestDescriptor::new(name, Method::GET, format!("{}delivery", FDFE_BASE))
                    .query("ot", offer_type.to_string())
                    .query("doc", doc)
                    .query("vc", version_code.to_string())
                    .query("dtok", params.require("dtok")?)
            }
        };

        Ok(request.headers(headers).authenticated())
    }

    fn offer_params(params: &Params) -> Result<(&str, u64, u64), ValidationError> {
        let doc = params.require("doc")?;
        validate_package_name("doc", doc)?;
        Ok((doc, params.require_u64("ot")?, params.require_u64("vc")?))
    }

    /// Headers every `fdfe` call carries; device and session headers only
    /// once they are known.
    pub(crate) fn base_headers(
        &self,
        binding: &DeviceBinding,
        token: Option<&str>,
    ) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Accept-Language".to_string(), self.locale.replace('_', "-")),
            ("User-Agent".to_string(), self.device.user_agent()),
            ("X-DFE-Client-Id".to_string(), CLIENT_ID.to_string()),
            ("X-DFE-MCCMNC".to_string(), self.device.cell_operator.clone()),
            ("X-DFE-Network-Type".to_string(), NETWORK_TYPE.to_string()),
        ];
        if let Some(android_id) = binding.android_id {
            headers.push(("X-DFE-Device-Id".to_string(), format!("{:x}", android_id)));
        }
        if let Some(token) = token {
            headers.push((
                "Authorization".to_string(),
                format!("GoogleLogin auth={}", token),
            ));
        }
        if let Some(ref config_token) = binding.device_config_token {
            headers.push(("X-DFE-Device-Config-Token".to_string(), config_token.clone()));
        }
        if let Some(ref consistency) = binding.checkin_consistency_token {
            headers.push((
                "X-DFE-Device-Checkin-Consistency-Token".to_string(),
                consistency.clone(),
            ));
        }
        headers
    }

    /// A login call against the account manager endpoint.
    pub(crate) fn auth_request(
        &self,
        form: Vec<(String, String)>,
        app: &str,
        android_id: Option<u64>,
    ) -> RequestDescriptor {
        let mut request = RequestDescriptor::new("auth", Method::POST, AUTH_URL)
            .header("User-Agent", self.device.auth_user_agent())
            .header("app", app);
        if let Some(android_id) = android_id {
            request = request.header("device", format!("{:x}", android_id));
        }
        request.body(Body::Form(form))
    }

    pub(crate) fn checkin_request(&self, body: Vec<u8>, binding: &DeviceBinding) -> RequestDescriptor {
        RequestDescriptor::new("checkin", Method::POST, CHECKIN_URL)
            .headers(self.base_headers(binding, None))
            .header("Content-Type", "application/x-protobuf")
            .body(Body::Protobuf(body))
    }

    pub(crate) fn upload_device_config_request(
        &self,
        body: Vec<u8>,
        binding: &DeviceBinding,
        token: &str,
    ) -> RequestDescriptor {
        RequestDescriptor::new(
            "uploadDeviceConfig",
            Method::POST,
            format!("{}uploadDeviceConfig", FDFE_BASE),
        )
        .headers(self.base_headers(binding, Some(token)))
        .header("Content-Type", "application/x-protobuf")
        .header("X-DFE-Enabled-Experiments", ENABLED_EXPERIMENTS)
        .header("X-DFE-Unsupported-Experiments", UNSUPPORTED_EXPERIMENTS)
        .header("X-DFE-SmallestScreenWidthDp", "320")
        .header("X-DFE-Filter-Level", "3")
        .body(Body::Protobuf(body))
        .authenticated()
    }
}

/// Resolve a store-relative URL (`list?c=3&cat=...`) against the `fdfe`
/// base, refusing anything that would leave the Play Store host.
pub fn resolve_store_url(relative: &str) -> Result<String, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidValue {
        field: "url",
        reason,
    };
    let base = Url::parse(FDFE_BASE).map_err(|e| invalid(e.to_string()))?;
    let resolved = base
        .join(relative.trim_start_matches('/').trim_start_matches("fdfe/"))
        .map_err(|e| invalid(format!("{:?}: {}", relative, e)))?;
    if resolved.host_str() != base.host_str() || !resolved.path().starts_with("/fdfe/") {
        return Err(invalid(format!("{:?} is not a Play Store URL", relative)));
    }
    Ok(resolved.to_string())
}
