//! Emulated device identity.
//!
//! Google Play filters its catalogue by device, so every session is bound
//! to one simulated phone. `DeviceProfile::default()` is a OnePlus One
//! (`bacon`); further profiles can be supplied through the config file.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::proto::{AndroidBuildProto, AndroidCheckinProto, DeviceConfigurationProto};

pub const DEFAULT_DEVICE: &str = "bacon";

/// Fallback when a profile carries no Play Store version string.
const DEFAULT_VENDING_VERSION_STRING: &str = "8.4.19.V-all [0] [FP] 175058788";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    pub user_readable_name: String,
    pub build: BuildInfo,
    pub client: String,
    pub gsf_version: i32,
    pub vending_version: i32,
    pub vending_version_string: Option<String>,
    pub cell_operator: String,
    pub sim_operator: String,
    pub roaming: String,
    pub touch_screen: i32,
    pub keyboard: i32,
    pub navigation: i32,
    pub screen_layout: i32,
    pub has_hard_keyboard: bool,
    pub has_five_way_navigation: bool,
    pub screen: ScreenInfo,
    pub gl_version: i32,
    pub gl_extensions: Vec<String>,
    pub shared_libraries: Vec<String>,
    pub features: Vec<String>,
    pub locales: Vec<String>,
    pub platforms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildInfo {
    pub fingerprint: String,
    pub id: String,
    pub hardware: String,
    pub brand: String,
    pub radio: String,
    pub bootloader: String,
    pub device: String,
    pub model: String,
    pub manufacturer: String,
    pub product: String,
    pub sdk_int: i32,
    pub release: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenInfo {
    pub density: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            fingerprint: "oneplus/bacon/A0001:6.0.1/MHC19Q/ZNH2KAS1KN:user/release-keys".into(),
            id: "MHC19Q".into(),
            hardware: "bacon".into(),
            brand: "oneplus".into(),
            radio: "unknown".into(),
            bootloader: "unknown".into(),
            device: "A0001".into(),
            model: "A0001".into(),
            manufacturer: "OnePlus".into(),
            product: "bacon".into(),
            sdk_int: 23,
            release: "6.0.1".into(),
        }
    }
}

impl Default for ScreenInfo {
    fn default() -> Self {
        Self {
            density: 480,
            width: 1080,
            height: 1920,
        }
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            user_readable_name: "OnePlus One (api23)".into(),
            build: BuildInfo::default(),
            client: "android-google".into(),
            gsf_version: 203615037,
            vending_version: 81031200,
            vending_version_string: Some("10.3.12-all [0] [PR] 198814133".into()),
            cell_operator: "310260".into(),
            sim_operator: "310260".into(),
            roaming: "mobile-notroaming".into(),
            touch_screen: 3,
            keyboard: 1,
            navigation: 1,
            screen_layout: 2,
            has_hard_keyboard: false,
            has_five_way_navigation: false,
            screen: ScreenInfo::default(),
            gl_version: 196608,
            gl_extensions: strings(&[
                "GL_AMD_compressed_ATC_texture",
                "GL_EXT_texture_format_BGRA8888",
                "GL_OES_compressed_ETC1_RGB8_texture",
                "GL_OES_texture_npot",
            ]),
            shared_libraries: strings(&[
                "android.test.runner",
                "com.android.future.usb.accessory",
                "com.android.location.provider",
                "javax.obex",
            ]),
            features: strings(&[
                "android.hardware.bluetooth",
                "android.hardware.camera",
                "android.hardware.location.gps",
                "android.hardware.screen.portrait",
                "android.hardware.telephony",
                "android.hardware.touchscreen",
                "android.hardware.wifi",
            ]),
            locales: strings(&["de", "en", "en_GB", "en_US", "es", "fr", "it"]),
            platforms: strings(&["armeabi-v7a", "armeabi"]),
        }
    }
}

impl DeviceProfile {
    /// `User-Agent` of the Play Store app running on this device.
    pub fn user_agent(&self) -> String {
        let version_string = self
            .vending_version_string
            .as_deref()
            .unwrap_or(DEFAULT_VENDING_VERSION_STRING);
        format!(
            "Android-Finsky/{} (api=3,versionCode={},sdk={},device={},hardware={},product={},\
             platformVersionRelease={},model={},buildId={},supportedAbis={})",
            version_string,
            self.vending_version,
            self.build.sdk_int,
            self.build.device,
            self.build.hardware,
            self.build.product,
            self.build.release,
            self.build.model,
            self.build.id,
            self.platforms.join(";"),
        )
    }

    /// `User-Agent` of the account manager during login.
    pub fn auth_user_agent(&self) -> String {
        format!("GoogleAuth/1.4 ({} {}); gzip", self.build.device, self.build.id)
    }

    pub fn checkin(&self) -> AndroidCheckinProto {
        AndroidCheckinProto {
            build: Some(self.android_build()),
            last_checkin_msec: Some(0),
            cell_operator: Some(self.cell_operator.clone()),
            sim_operator: Some(self.sim_operator.clone()),
            roaming: Some(self.roaming.clone()),
            user_number: Some(0),
        }
    }

    fn android_build(&self) -> AndroidBuildProto {
        AndroidBuildProto {
            id: Some(self.build.fingerprint.clone()),
            product: Some(self.build.hardware.clone()),
            carrier: Some(self.build.brand.clone()),
            radio: Some(self.build.radio.clone()),
            bootloader: Some(self.build.bootloader.clone()),
            client: Some(self.client.clone()),
            timestamp: Some(Utc::now().timestamp()),
            google_services: Some(self.gsf_version),
            device: Some(self.build.device.clone()),
            sdk_version: Some(self.build.sdk_int),
            model: Some(self.build.model.clone()),
            manufacturer: Some(self.build.manufacturer.clone()),
            build_product: Some(self.build.product.clone()),
            ota_installed: Some(false),
        }
    }

    pub fn device_configuration(&self) -> DeviceConfigurationProto {
        DeviceConfigurationProto {
            touch_screen: Some(self.touch_screen),
            keyboard: Some(self.keyboard),
            navigation: Some(self.navigation),
            screen_layout: Some(self.screen_layout),
            has_hard_keyboard: Some(self.has_hard_keyboard),
            has_five_way_navigation: Some(self.has_five_way_navigation),
            screen_density: Some(self.screen.density),
            gl_es_version: Some(self.gl_version),
            system_shared_library: self.shared_libraries.clone(),
            system_available_feature: self.features.clone(),
            native_platform: self.platforms.clone(),
            screen_width: Some(self.screen.width),
            screen_height: Some(self.screen.height),
            system_supported_locale: self.locales.clone(),
            gl_extension: self.gl_extensions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_lists_device_and_abis() {
        let agent = DeviceProfile::default().user_agent();
        assert!(agent.starts_with("Android-Finsky/10.3.12-all [0] [PR] 198814133 (api=3,"));
        assert!(agent.contains("sdk=23,device=A0001,hardware=bacon"));
        assert!(agent.ends_with("supportedAbis=armeabi-v7a;armeabi)"));
    }

    #[test]
    fn test_partial_profile_fills_defaults() {
        let json = r#"{"user_readable_name": "Pixel", "build": {"device": "sailfish", "sdk_int": 28}}"#;
        let profile: DeviceProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.user_readable_name, "Pixel");
        assert_eq!(profile.build.device, "sailfish");
        assert_eq!(profile.build.sdk_int, 28);
        assert_eq!(profile.build.hardware, "bacon");
        assert_eq!(profile.platforms, DeviceProfile::default().platforms);
    }

    #[test]
    fn test_checkin_carries_build_identity() {
        let checkin = DeviceProfile::default().checkin();
        let build = checkin.build.unwrap();
        assert_eq!(build.sdk_version, Some(23));
        assert_eq!(build.manufacturer.as_deref(), Some("OnePlus"));
        assert_eq!(checkin.cell_operator.as_deref(), Some("310260"));
    }
}
