use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::parse::{
    package_id_from_url, parse_category_page, parse_package_index, parse_package_page,
    CategoryListing,
};
use super::request::{FDroidOperation, FDroidRequestBuilder};
use crate::api::request::validate_package_name;
use crate::api::{ClientError, HttpTransport, Params, RawResponse, Transport};
use crate::models::{ApkLocation, AppInfo, AppPage, Category, ItemError, Partial, SubCategory};

/// Package pages fetched at once during discovery.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Name and id of the single synthetic top-level category.
pub const ROOT_CATEGORY: &str = "F-Droid";

/// F-Droid website client. No account is needed, so there is no session.
pub struct FDroidClient<T = HttpTransport> {
    transport: T,
    builder: FDroidRequestBuilder,
    concurrency: usize,
}

impl<T: Transport> FDroidClient<T> {
    pub fn new(transport: T) -> Result<Self, ClientError> {
        Ok(Self {
            transport,
            builder: FDroidRequestBuilder::new()?,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn fetch(&self, operation: FDroidOperation, params: &Params) -> Result<RawResponse, ClientError> {
        let request = self.builder.build(operation, params)?;
        Ok(self.transport.send(&request).await?.check()?)
    }

    /// `package` is a package name or the site path of its details page.
    async fn package_page(&self, package: &str) -> Result<AppInfo, ClientError> {
        let response = self
            .fetch(FDroidOperation::PackagePage, &Params::new().with("package", package))
            .await?;
        Ok(parse_package_page(&response.text(), &response.url)?)
    }

    pub async fn fetch_details(&self, package: &str) -> Result<AppInfo, ClientError> {
        debug!(package, "Fetching details");
        self.package_page(package).await
    }

    /// The website has no category tree; everything hangs off one root.
    pub fn root_category() -> Category {
        Category {
            id: ROOT_CATEGORY.to_string(),
            name: ROOT_CATEGORY.to_string(),
            data_url: String::new(),
        }
    }

    pub async fn categories(&self) -> Result<Partial<Category>, ClientError> {
        Ok(Partial {
            records: vec![Self::root_category()],
            errors: Vec::new(),
        })
    }

    /// The website categories. Every F-Droid app is free, so `free_only`
    /// changes nothing.
    pub async fn subcategories(
        &self,
        category: &Category,
        _free_only: bool,
    ) -> Result<Partial<SubCategory>, ClientError> {
        let response = self.fetch(FDroidOperation::PackageIndex, &Params::new()).await?;
        let subcategories = parse_package_index(&response.text(), category)?;
        debug!(count = subcategories.len(), failed = subcategories.errors.len(), "Parsed categories");
        Ok(subcategories)
    }

    /// All apps of a website category, following its further listing pages.
    ///
    /// Package pages are fetched concurrently; a page that fails to load or
    /// parse becomes an item error and the rest are still returned. A
    /// further listing page that fails is reported in `page_errors`.
    pub async fn discover_apps(&self, subcategory: &SubCategory) -> Result<AppPage, ClientError> {
        info!(category = %subcategory.display_name(), "Discovering apps");
        let listing = self.listing_page(&subcategory.data_url).await?;

        let mut packages = listing.packages;
        let mut page_errors = Vec::new();
        for (index, page) in listing.pages.iter().enumerate() {
            match self.listing_page(page).await {
                Ok(more) => {
                    for href in more.packages {
                        if !packages.contains(&href) {
                            packages.push(href);
                        }
                    }
                }
                Err(err) => {
                    warn!(page = %page, error = %err, "Listing page failed");
                    page_errors.push(ItemError::new(index, Some(page.clone()), err));
                }
            }
        }
        debug!(count = packages.len(), "Collected package links");

        let results: Vec<_> = stream::iter(packages.into_iter().enumerate())
            .map(|(index, href)| async move {
                let result = self.package_page(&href).await;
                (index, href, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut apps = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for (index, href, result) in results {
            match result {
                Ok(app) => apps.push(app),
                Err(error) => {
                    warn!(package = %href, error = %error, "Skipping package");
                    errors.push(ItemError::new(index, package_id_from_url(&href), error));
                }
            }
        }

        Ok(AppPage {
            apps,
            errors,
            page_errors,
            next_page_url: None,
            category: Some(subcategory.parent.id.clone()),
        })
    }

    async fn listing_page(&self, path: &str) -> Result<CategoryListing, ClientError> {
        let response = self
            .fetch(FDroidOperation::CategoryPage, &Params::new().with("path", path))
            .await?;
        Ok(parse_category_page(&response.text())?)
    }

    /// Discovery already follows every listing page.
    pub async fn next_page(&self, _page: &AppPage) -> Result<AppPage, ClientError> {
        Err(ClientError::Exhausted)
    }

    pub fn apk_location(&self, app: &AppInfo) -> Result<ApkLocation, ClientError> {
        validate_package_name("id", &app.id)?;
        let path = format!("/repo/{}_{}.apk", app.id, app.version_code);
        Ok(ApkLocation {
            package: app.id.clone(),
            version_code: app.version_code,
            url: self.builder.site_url("id", &path)?,
        })
    }
}
