use serde::{Deserialize, Serialize};

/// A top-level browse category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Store-relative URL the category's contents are served from.
    pub data_url: String,
}

/// A listing within a category (Google Play: "Top Free"; F-Droid: a
/// website category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: String,
    pub name: String,
    pub data_url: String,
    pub parent: Category,
}

impl SubCategory {
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.parent.name, self.name)
    }

    /// Paid listings only contain apps that would have to be bought.
    pub fn is_paid(&self) -> bool {
        self.id.contains("paid")
    }
}
