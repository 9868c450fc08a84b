use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Store {
    GooglePlay,
    FDroid,
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Store::GooglePlay => write!(f, "Google Play"),
            Store::FDroid => write!(f, "F-Droid"),
        }
    }
}

/// One app listing.
///
/// `id`, `name`, `version` and `version_code` are always present; a parser
/// that cannot find them fails instead of filling in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    /// Package name, unique within its store.
    pub id: String,
    pub name: String,
    pub version: String,
    pub version_code: u64,
    pub store: Store,
    pub creator: Option<String>,
    /// Installation size in bytes.
    pub size: Option<u64>,
    pub category: Option<String>,
    pub description_short: Option<String>,
    pub description_html: Option<String>,
    /// Download count as the store displays it ("1,000,000+").
    pub downloads: Option<String>,
    pub upload_date: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub rating: Option<Rating>,
    pub offer_type: Option<i32>,
    pub contains_ads: Option<bool>,
}

impl AppInfo {
    pub fn new(
        store: Store,
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        version_code: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            version_code,
            store,
            creator: None,
            size: None,
            category: None,
            description_short: None,
            description_html: None,
            downloads: None,
            upload_date: None,
            permissions: Vec::new(),
            rating: None,
            offer_type: None,
            contains_ads: None,
        }
    }
}

/// Aggregate user rating with the per-star breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f32,
    pub total: u64,
    pub one_star: u64,
    pub two_star: u64,
    pub three_star: u64,
    pub four_star: u64,
    pub five_star: u64,
}

impl Rating {
    /// Sum of the per-star counts; may differ from `total` upstream.
    pub fn counted(&self) -> u64 {
        self.one_star + self.two_star + self.three_star + self.four_star + self.five_star
    }
}
