use serde::{Deserialize, Serialize};

/// Everything needed to download one Google Play app version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub package: String,
    pub version_code: u64,
    pub download_url: String,
    /// Cookies the download URL must be requested with.
    pub cookies: Vec<DownloadCookie>,
    pub splits: Vec<SplitApk>,
    pub additional_files: Vec<AdditionalFile>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadCookie {
    pub name: String,
    pub value: String,
}

impl std::fmt::Debug for DownloadCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadCookie")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitApk {
    pub name: String,
    pub download_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObbKind {
    Main,
    Patch,
}

/// An expansion (OBB) file shipped next to the APK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalFile {
    pub kind: ObbKind,
    pub version_code: u64,
    pub download_url: String,
}

impl AdditionalFile {
    /// File name Android expects, e.g. `main.31.com.example.app.obb`.
    pub fn file_name(&self, package: &str) -> String {
        let kind = match self.kind {
            ObbKind::Main => "main",
            ObbKind::Patch => "patch",
        };
        format!("{}.{}.{}.obb", kind, self.version_code, package)
    }
}

/// Repository location of an F-Droid APK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApkLocation {
    pub package: String,
    pub version_code: u64,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obb_file_name() {
        let file = AdditionalFile {
            kind: ObbKind::Patch,
            version_code: 31,
            download_url: "https://example.org/obb".into(),
        };
        assert_eq!(file.file_name("com.example.app"), "patch.31.com.example.app.obb");
    }
}
