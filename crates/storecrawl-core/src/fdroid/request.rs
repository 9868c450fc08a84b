use reqwest::Method;
use url::Url;

use crate::api::request::validate_package_name;
use crate::api::{Params, RequestDescriptor, ValidationError};

pub const FDROID_BASE: &str = "https://f-droid.org";

/// A logical F-Droid website operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FDroidOperation {
    /// Details page of one package (`package` is a name or a site path).
    PackagePage,
    /// `/en/packages/`, listing the website categories.
    PackageIndex,
    /// One category listing (`path`).
    CategoryPage,
}

impl FDroidOperation {
    pub fn name(self) -> &'static str {
        match self {
            FDroidOperation::PackagePage => "package_page",
            FDroidOperation::PackageIndex => "package_index",
            FDroidOperation::CategoryPage => "category_page",
        }
    }

    pub fn required(self) -> &'static [&'static str] {
        match self {
            FDroidOperation::PackagePage => &["package"],
            FDroidOperation::PackageIndex => &[],
            FDroidOperation::CategoryPage => &["path"],
        }
    }
}

/// Builds requests against the public website. No session is involved.
#[derive(Debug, Clone)]
pub struct FDroidRequestBuilder {
    base: Url,
}

impl FDroidRequestBuilder {
    pub fn new() -> Result<Self, ValidationError> {
        Self::with_base(FDROID_BASE)
    }

    pub fn with_base(base: &str) -> Result<Self, ValidationError> {
        let base = Url::parse(base).map_err(|e| ValidationError::InvalidValue {
            field: "base",
            reason: e.to_string(),
        })?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn build(
        &self,
        operation: FDroidOperation,
        params: &Params,
    ) -> Result<RequestDescriptor, ValidationError> {
        for field in operation.required() {
            params.require(field)?;
        }

        let url = match operation {
            FDroidOperation::PackagePage => {
                let package = params.require("package")?;
                if package.starts_with('/') {
                    if package.contains("/categories/") {
                        return Err(ValidationError::InvalidValue {
                            field: "package",
                            reason: format!("{} is a category, not a package", package),
                        });
                    }
                    self.site_url("package", package)?
                } else {
                    validate_package_name("package", package)?;
                    self.site_url("package", &format!("/en/packages/{}/", package))?
                }
            }
            FDroidOperation::PackageIndex => self.site_url("path", "/en/packages/")?,
            FDroidOperation::CategoryPage => self.site_url("path", params.require("path")?)?,
        };

        Ok(RequestDescriptor::new(operation.name(), Method::GET, url))
    }

    /// Resolve a site-relative path, refusing other hosts.
    pub fn site_url(&self, field: &'static str, path: &str) -> Result<String, ValidationError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| ValidationError::InvalidValue {
                field,
                reason: format!("{:?}: {}", path, e),
            })?;
        if url.host_str() != self.base.host_str() {
            return Err(ValidationError::InvalidValue {
                field,
                reason: format!("{:?} leaves {}", path, self.base),
            });
        }
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> FDroidRequestBuilder {
        FDroidRequestBuilder::new().unwrap()
    }

    #[test]
    fn test_package_page_by_name_and_path() {
        let by_name = builder()
            .build(
                FDroidOperation::PackagePage,
                &Params::new().with("package", "org.example.notes"),
            )
            .unwrap();
        assert_eq!(by_name.url(), "https://f-droid.org/en/packages/org.example.notes/");
        assert!(!by_name.is_authenticated());

        let by_path = builder()
            .build(
                FDroidOperation::PackagePage,
                &Params::new().with("package", "/en/packages/org.example.notes/"),
            )
            .unwrap();
        assert_eq!(by_name, by_path);
    }

    #[test]
    fn test_category_path_is_not_a_package() {
        let err = builder()
            .build(
                FDroidOperation::PackagePage,
                &Params::new().with("package", "/en/categories/games/"),
            )
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field: "package", .. }));
    }

    #[test]
    fn test_missing_path() {
        assert_eq!(
            builder()
                .build(FDroidOperation::CategoryPage, &Params::new())
                .unwrap_err(),
            ValidationError::MissingField("path")
        );
    }

    #[test]
    fn test_foreign_host_is_rejected() {
        let err = builder()
            .build(
                FDroidOperation::CategoryPage,
                &Params::new().with("path", "https://example.org/en/categories/games/"),
            )
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field: "path", .. }));
    }
}
