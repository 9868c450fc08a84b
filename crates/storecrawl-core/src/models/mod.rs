//! Domain records produced by the response parsers.
//!
//! - `AppInfo`: one app listing, with `Rating` and the `Store` it came from
//! - `Category`, `SubCategory`: the browse tree of a store
//! - `AppPage`, `Partial`, `ItemError`: collections that carry per-item failures
//! - `Delivery`, `ApkLocation`: where the APK of one app version can be fetched

pub mod app;
pub mod category;
pub mod delivery;
pub mod page;

pub use app::{AppInfo, Rating, Store};
pub use category::{Category, SubCategory};
pub use delivery::{AdditionalFile, ApkLocation, Delivery, DownloadCookie, ObbKind, SplitApk};
pub use page::{AppPage, ItemError, Partial};
