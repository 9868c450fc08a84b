//! The operations both store clients offer, for callers that crawl either.

use async_trait::async_trait;

use crate::api::{ClientError, Transport};
use crate::auth::Authenticator;
use crate::fdroid::FDroidClient;
use crate::models::{AppInfo, AppPage, Category, Partial, Store, SubCategory};
use crate::play::PlayClient;

#[async_trait]
pub trait AppStore: Send + Sync {
    fn store(&self) -> Store;

    async fn fetch_details(&self, package: &str) -> Result<AppInfo, ClientError>;

    async fn categories(&self) -> Result<Partial<Category>, ClientError>;

    async fn subcategories(
        &self,
        category: &Category,
        free_only: bool,
    ) -> Result<Partial<SubCategory>, ClientError>;

    async fn discover_apps(&self, subcategory: &SubCategory) -> Result<AppPage, ClientError>;

    async fn next_page(&self, page: &AppPage) -> Result<AppPage, ClientError>;
}

#[async_trait]
impl<T: Transport, A: Authenticator> AppStore for PlayClient<T, A> {
    fn store(&self) -> Store {
        Store::GooglePlay
    }

    async fn fetch_details(&self, package: &str) -> Result<AppInfo, ClientError> {
        PlayClient::fetch_details(self, package).await
    }

    async fn categories(&self) -> Result<Partial<Category>, ClientError> {
        PlayClient::categories(self).await
    }

    async fn subcategories(
        &self,
        category: &Category,
        free_only: bool,
    ) -> Result<Partial<SubCategory>, ClientError> {
        PlayClient::subcategories(self, category, free_only).await
    }

    async fn discover_apps(&self, subcategory: &SubCategory) -> Result<AppPage, ClientError> {
        PlayClient::discover_apps(self, subcategory).await
    }

    async fn next_page(&self, page: &AppPage) -> Result<AppPage, ClientError> {
        PlayClient::next_page(self, page).await
    }
}

#[async_trait]
impl<T: Transport> AppStore for FDroidClient<T> {
    fn store(&self) -> Store {
        Store::FDroid
    }

    async fn fetch_details(&self, package: &str) -> Result<AppInfo, ClientError> {
        FDroidClient::fetch_details(self, package).await
    }

    async fn categories(&self) -> Result<Partial<Category>, ClientError> {
        FDroidClient::categories(self).await
    }

    async fn subcategories(
        &self,
        category: &Category,
        free_only: bool,
    ) -> Result<Partial<SubCategory>, ClientError> {
        FDroidClient::subcategories(self, category, free_only).await
    }

    async fn discover_apps(&self, subcategory: &SubCategory) -> Result<AppPage, ClientError> {
        FDroidClient::discover_apps(self, subcategory).await
    }

    async fn next_page(&self, page: &AppPage) -> Result<AppPage, ClientError> {
        FDroidClient::next_page(self, page).await
    }
}
