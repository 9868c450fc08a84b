//! Subset of the Play Store `fdfe` / checkin protobuf messages.
//!
//! Field numbers follow the reverse-engineered `googleplay.proto`. Only the
//! fields this crate reads or writes are declared; prost skips the rest.
//! Scalars are `optional` so a missing field stays distinguishable from a
//! zero value.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResponseWrapper {
    #[prost(message, optional, tag = "1")]
    pub payload: Option<Payload>,
    #[prost(message, optional, tag = "2")]
    pub commands: Option<ServerCommands>,
    #[prost(message, repeated, tag = "3")]
    pub pre_fetch: Vec<PreFetch>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ServerCommands {
    #[prost(bool, optional, tag = "1")]
    pub clear_cache: Option<bool>,
    #[prost(string, optional, tag = "2")]
    pub display_error_message: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PreFetch {
    #[prost(string, optional, tag = "1")]
    pub url: Option<String>,
    /// A serialized `ResponseWrapper`.
    #[prost(bytes = "vec", optional, tag = "2")]
    pub response: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Payload {
    #[prost(message, optional, tag = "1")]
    pub list_response: Option<ListResponse>,
    #[prost(message, optional, tag = "2")]
    pub details_response: Option<DetailsResponse>,
    #[prost(message, optional, tag = "4")]
    pub buy_response: Option<BuyResponse>,
    #[prost(message, optional, tag = "7")]
    pub browse_response: Option<BrowseResponse>,
    #[prost(message, optional, tag = "21")]
    pub delivery_response: Option<DeliveryResponse>,
    #[prost(message, optional, tag = "28")]
    pub upload_device_config_response: Option<UploadDeviceConfigResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListResponse {
    #[prost(message, repeated, tag = "2")]
    pub doc: Vec<DocV2>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DetailsResponse {
    #[prost(message, optional, tag = "4")]
    pub doc_v2: Option<DocV2>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BrowseResponse {
    #[prost(string, optional, tag = "1")]
    pub contents_url: Option<String>,
    #[prost(message, repeated, tag = "3")]
    pub category: Vec<BrowseLink>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BrowseLink {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub data_url: Option<String>,
    #[prost(message, optional, tag = "5")]
    pub unknown_category_container: Option<UnknownCategoryContainer>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UnknownCategoryContainer {
    #[prost(message, optional, tag = "5")]
    pub category_id_container: Option<CategoryIdContainer>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CategoryIdContainer {
    #[prost(string, optional, tag = "4")]
    pub category_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DocV2 {
    #[prost(string, optional, tag = "1")]
    pub docid: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub title: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub creator: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub description_html: Option<String>,
    #[prost(message, repeated, tag = "8")]
    pub offer: Vec<Offer>,
    #[prost(message, repeated, tag = "11")]
    pub child: Vec<DocV2>,
    #[prost(message, optional, tag = "12")]
    pub container_metadata: Option<ContainerMetadata>,
    #[prost(message, optional, tag = "13")]
    pub details: Option<DocumentDetails>,
    #[prost(message, optional, tag = "14")]
    pub aggregate_rating: Option<AggregateRating>,
    #[prost(string, optional, tag = "17")]
    pub share_url: Option<String>,
    #[prost(string, optional, tag = "27")]
    pub description_short: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContainerMetadata {
    #[prost(string, optional, tag = "1")]
    pub browse_url: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub next_page_url: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DocumentDetails {
    #[prost(message, optional, tag = "1")]
    pub app_details: Option<AppDetails>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AppDetails {
    #[prost(string, optional, tag = "1")]
    pub developer_name: Option<String>,
    #[prost(int32, optional, tag = "3")]
    pub version_code: Option<i32>,
    #[prost(string, optional, tag = "4")]
    pub version_string: Option<String>,
    #[prost(string, repeated, tag = "7")]
    pub app_category: Vec<String>,
    #[prost(int64, optional, tag = "9")]
    pub installation_size: Option<i64>,
    #[prost(string, repeated, tag = "10")]
    pub permission: Vec<String>,
    #[prost(string, optional, tag = "13")]
    pub num_downloads: Option<String>,
    #[prost(string, optional, tag = "14")]
    pub package_name: Option<String>,
    #[prost(string, optional, tag = "16")]
    pub upload_date: Option<String>,
    #[prost(string, optional, tag = "30")]
    pub contains_ads: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AggregateRating {
    #[prost(float, optional, tag = "2")]
    pub star_rating: Option<f32>,
    #[prost(uint64, optional, tag = "3")]
    pub ratings_count: Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    pub one_star_ratings: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub two_star_ratings: Option<u64>,
    #[prost(uint64, optional, tag = "6")]
    pub three_star_ratings: Option<u64>,
    #[prost(uint64, optional, tag = "7")]
    pub four_star_ratings: Option<u64>,
    #[prost(uint64, optional, tag = "8")]
    pub five_star_ratings: Option<u64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Offer {
    #[prost(int64, optional, tag = "1")]
    pub micros: Option<i64>,
    #[prost(string, optional, tag = "2")]
    pub currency_code: Option<String>,
    #[prost(int32, optional, tag = "8")]
    pub offer_type: Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuyResponse {
    #[prost(string, optional, tag = "55")]
    pub download_token: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeliveryResponse {
    #[prost(int32, optional, tag = "1")]
    pub status: Option<i32>,
    #[prost(message, optional, tag = "2")]
    pub app_delivery_data: Option<AndroidAppDeliveryData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AndroidAppDeliveryData {
    #[prost(int64, optional, tag = "1")]
    pub download_size: Option<i64>,
    #[prost(string, optional, tag = "3")]
    pub download_url: Option<String>,
    #[prost(message, repeated, tag = "4")]
    pub additional_file: Vec<AppFileMetadata>,
    #[prost(message, repeated, tag = "5")]
    pub download_auth_cookie: Vec<HttpCookie>,
    #[prost(message, repeated, tag = "15")]
    pub split: Vec<SplitDeliveryData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AppFileMetadata {
    #[prost(int32, optional, tag = "1")]
    pub file_type: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub version_code: Option<i32>,
    #[prost(int64, optional, tag = "3")]
    pub size: Option<i64>,
    #[prost(string, optional, tag = "4")]
    pub download_url: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpCookie {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub value: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SplitDeliveryData {
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    #[prost(int64, optional, tag = "2")]
    pub download_size: Option<i64>,
    #[prost(string, optional, tag = "5")]
    pub download_url: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UploadDeviceConfigRequest {
    #[prost(message, optional, tag = "1")]
    pub device_configuration: Option<DeviceConfigurationProto>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UploadDeviceConfigResponse {
    #[prost(string, optional, tag = "1")]
    pub upload_device_config_token: Option<String>,
}

// ===== Checkin =====

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AndroidCheckinRequest {
    #[prost(int64, optional, tag = "2")]
    pub id: Option<i64>,
    #[prost(message, optional, tag = "4")]
    pub checkin: Option<AndroidCheckinProto>,
    #[prost(string, optional, tag = "6")]
    pub locale: Option<String>,
    #[prost(string, repeated, tag = "11")]
    pub account_cookie: Vec<String>,
    #[prost(string, optional, tag = "12")]
    pub time_zone: Option<String>,
    #[prost(fixed64, optional, tag = "13")]
    pub security_token: Option<u64>,
    #[prost(int32, optional, tag = "14")]
    pub version: Option<i32>,
    #[prost(message, optional, tag = "18")]
    pub device_configuration: Option<DeviceConfigurationProto>,
    #[prost(int32, optional, tag = "20")]
    pub fragment: Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AndroidCheckinProto {
    #[prost(message, optional, tag = "1")]
    pub build: Option<AndroidBuildProto>,
    #[prost(int64, optional, tag = "2")]
    pub last_checkin_msec: Option<i64>,
    #[prost(string, optional, tag = "6")]
    pub cell_operator: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub sim_operator: Option<String>,
    #[prost(string, optional, tag = "8")]
    pub roaming: Option<String>,
    #[prost(int32, optional, tag = "9")]
    pub user_number: Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AndroidBuildProto {
    #[prost(string, optional, tag = "1")]
    pub id: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub product: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub carrier: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub radio: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub bootloader: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub client: Option<String>,
    #[prost(int64, optional, tag = "7")]
    pub timestamp: Option<i64>,
    #[prost(int32, optional, tag = "8")]
    pub google_services: Option<i32>,
    #[prost(string, optional, tag = "9")]
    pub device: Option<String>,
    #[prost(int32, optional, tag = "10")]
    pub sdk_version: Option<i32>,
    #[prost(string, optional, tag = "11")]
    pub model: Option<String>,
    #[prost(string, optional, tag = "12")]
    pub manufacturer: Option<String>,
    #[prost(string, optional, tag = "13")]
    pub build_product: Option<String>,
    #[prost(bool, optional, tag = "14")]
    pub ota_installed: Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AndroidCheckinResponse {
    #[prost(bool, optional, tag = "1")]
    pub stats_ok: Option<bool>,
    #[prost(fixed64, optional, tag = "7")]
    pub android_id: Option<u64>,
    #[prost(fixed64, optional, tag = "8")]
    pub security_token: Option<u64>,
    #[prost(string, optional, tag = "12")]
    pub device_checkin_consistency_token: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceConfigurationProto {
    #[prost(int32, optional, tag = "1")]
    pub touch_screen: Option<i32>,
    #[prost(int32, optional, tag = "2")]
    pub keyboard: Option<i32>,
    #[prost(int32, optional, tag = "3")]
    pub navigation: Option<i32>,
    #[prost(int32, optional, tag = "4")]
    pub screen_layout: Option<i32>,
    #[prost(bool, optional, tag = "5")]
    pub has_hard_keyboard: Option<bool>,
    #[prost(bool, optional, tag = "6")]
    pub has_five_way_navigation: Option<bool>,
    #[prost(int32, optional, tag = "7")]
    pub screen_density: Option<i32>,
    #[prost(int32, optional, tag = "8")]
    pub gl_es_version: Option<i32>,
    #[prost(string, repeated, tag = "9")]
    pub system_shared_library: Vec<String>,
    #[prost(string, repeated, tag = "10")]
    pub system_available_feature: Vec<String>,
    #[prost(string, repeated, tag = "11")]
    pub native_platform: Vec<String>,
    #[prost(int32, optional, tag = "12")]
    pub screen_width: Option<i32>,
    #[prost(int32, optional, tag = "13")]
    pub screen_height: Option<i32>,
    #[prost(string, repeated, tag = "14")]
    pub system_supported_locale: Vec<String>,
    #[prost(string, repeated, tag = "15")]
    pub gl_extension: Vec<String>,
}
