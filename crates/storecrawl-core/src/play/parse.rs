//! Decoding of `fdfe` protobuf replies and `auth` key/value replies into
//! domain records.
//!
//! Collections are parsed item by item; one malformed document never
//! discards its siblings.

use std::collections::HashMap;

use prost::Message;
use url::Url;

use super::proto::{
    AggregateRating, AndroidCheckinResponse, BrowseLink, DocV2, ListResponse, Payload, PreFetch,
    ResponseWrapper,
};
use super::request::FDFE_BASE;
use crate::api::{AuthError, ClientError, ParseError};
use crate::models::{
    AdditionalFile, AppInfo, Category, Delivery, DownloadCookie, ObbKind, Partial, Rating,
    SplitApk, Store, SubCategory,
};
use crate::utils::non_empty;

pub fn parse_wrapper(body: &[u8]) -> Result<ResponseWrapper, ParseError> {
    ResponseWrapper::decode(body)
        .map_err(|e| ParseError::format(format!("undecodable response wrapper: {}", e)))
}

/// The error message the store embedded in the reply, if any.
pub fn server_error(wrapper: &ResponseWrapper) -> Option<&str> {
    wrapper
        .commands
        .as_ref()
        .and_then(|c| c.display_error_message.as_deref())
        .filter(|m| !m.trim().is_empty())
}

fn payload(wrapper: &ResponseWrapper) -> Result<&Payload, ParseError> {
    wrapper.payload.as_ref().ok_or_else(|| ParseError::missing("payload"))
}

/// Build an `AppInfo` from one document.
pub fn app_from_doc(doc: &DocV2) -> Result<AppInfo, ParseError> {
    let id = non_empty(doc.docid.as_deref()).ok_or_else(|| ParseError::missing("id"))?;
    let name = non_empty(doc.title.as_deref()).ok_or_else(|| ParseError::missing_in("name", &id))?;
    let details = doc
        .details
        .as_ref()
        .and_then(|d| d.app_details.as_ref())
        .ok_or_else(|| ParseError::missing_in("version", &id))?;
    let version = non_empty(details.version_string.as_deref())
        .ok_or_else(|| ParseError::missing_in("version", &id))?;
    let version_code = details
        .version_code
        .ok_or_else(|| ParseError::missing_in("version_code", &id))?;
    let version_code = u64::try_from(version_code).map_err(|_| {
        ParseError::format(format!("negative version code {} in {}", version_code, id))
    })?;

    let mut app = AppInfo::new(Store::GooglePlay, id, name, version, version_code);
    app.creator = non_empty(doc.creator.as_deref())
        .or_else(|| non_empty(details.developer_name.as_deref()));
    app.size = details.installation_size.and_then(|s| u64::try_from(s).ok());
    app.category = details.app_category.first().cloned();
    app.description_short = non_empty(doc.description_short.as_deref());
    app.description_html = non_empty(doc.description_html.as_deref());
    app.downloads = non_empty(details.num_downloads.as_deref());
    app.upload_date = non_empty(details.upload_date.as_deref());
    app.permissions = details.permission.clone();
    app.rating = doc.aggregate_rating.as_ref().map(rating);
    app.offer_type = doc.offer.first().and_then(|o| o.offer_type);
    app.contains_ads = details.contains_ads.as_deref().map(|s| !s.trim().is_empty());
    Ok(app)
}

fn rating(aggregate: &AggregateRating) -> Rating {
    Rating {
        average: aggregate.star_rating.unwrap_or_default(),
        total: aggregate.ratings_count.unwrap_or_default(),
        one_star: aggregate.one_star_ratings.unwrap_or_default(),
        two_star: aggregate.two_star_ratings.unwrap_or_default(),
        three_star: aggregate.three_star_ratings.unwrap_or_default(),
        four_star: aggregate.four_star_ratings.unwrap_or_default(),
        five_star: aggregate.five_star_ratings.unwrap_or_default(),
    }
}

pub fn parse_details(wrapper: &ResponseWrapper) -> Result<AppInfo, ParseError> {
    let doc = payload(wrapper)?
        .details_response
        .as_ref()
        .and_then(|d| d.doc_v2.as_ref())
        .ok_or_else(|| ParseError::missing("detailsResponse.docV2"))?;
    app_from_doc(doc)
}

/// Value of the `cat` query parameter of a store-relative URL.
fn category_param(data_url: &str) -> Option<String> {
    let url = Url::parse(FDFE_BASE).ok()?.join(data_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "cat")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

pub fn parse_categories(wrapper: &ResponseWrapper) -> Result<Partial<Category>, ParseError> {
    let browse = payload(wrapper)?
        .browse_response
        .as_ref()
        .ok_or_else(|| ParseError::missing("browseResponse"))?;

    let mut categories = Partial::default();
    for (index, link) in browse.category.iter().enumerate() {
        categories.push(index, category_from_link(link));
    }
    Ok(categories)
}

type ItemResult<T> = Result<T, (Option<String>, ParseError)>;

fn category_from_link(link: &BrowseLink) -> ItemResult<Category> {
    let name = non_empty(link.name.as_deref()).ok_or((None, ParseError::missing("name")))?;
    let data_url = non_empty(link.data_url.as_deref())
        .ok_or_else(|| (Some(name.clone()), ParseError::missing_in("data_url", &name)))?;
    let id = link
        .unknown_category_container
        .as_ref()
        .and_then(|c| c.category_id_container.as_ref())
        .and_then(|c| non_empty(c.category_id.as_deref()))
        .or_else(|| category_param(&data_url))
        .ok_or_else(|| (Some(name.clone()), ParseError::missing_in("id", &name)))?;
    Ok(Category { id, name, data_url })
}

/// Subcategories are announced as pre-fetched `list` responses; only
/// entries whose URL names a list (`ctr=`) count.
pub fn parse_subcategories(
    wrapper: &ResponseWrapper,
    parent: &Category,
) -> Partial<SubCategory> {
    let mut subcategories = Partial::default();
    let lists = wrapper
        .pre_fetch
        .iter()
        .filter(|p| p.url.as_deref().is_some_and(|u| u.contains("ctr=")));

    for (index, prefetch) in lists.enumerate() {
        subcategories.push(index, subcategory_from_prefetch(prefetch, parent));
    }
    subcategories
}

fn subcategory_from_prefetch(prefetch: &PreFetch, parent: &Category) -> ItemResult<SubCategory> {
    let data_url = prefetch.url.clone().unwrap_or_default();
    let inner = ResponseWrapper::decode(prefetch.response.as_deref().unwrap_or_default())
        .map_err(|e| {
            (
                Some(data_url.clone()),
                ParseError::format(format!("undecodable pre-fetched list: {}", e)),
            )
        })?;
    let head = first_list_child(&inner).map_err(|e| (Some(data_url.clone()), e))?;
    let id = non_empty(head.docid.as_deref())
        .ok_or_else(|| (Some(data_url.clone()), ParseError::missing_in("id", &data_url)))?;
    let name = non_empty(head.title.as_deref())
        .ok_or_else(|| (Some(id.clone()), ParseError::missing_in("name", &id)))?;
    Ok(SubCategory {
        id,
        name,
        data_url,
        parent: parent.clone(),
    })
}

/// `listResponse.doc[0].child[0]`: the container every list reply nests
/// its apps in.
fn first_list_child(wrapper: &ResponseWrapper) -> Result<&DocV2, ParseError> {
    payload(wrapper)?
        .list_response
        .as_ref()
        .and_then(|l: &ListResponse| l.doc.first())
        .and_then(|d| d.child.first())
        .ok_or_else(|| ParseError::missing("listResponse.doc.child"))
}

/// Apps of one list page plus the URL of the following page.
pub fn parse_app_page(
    wrapper: &ResponseWrapper,
) -> Result<(Partial<AppInfo>, Option<String>), ParseError> {
    let container = first_list_child(wrapper)?;

    let mut apps = Partial::default();
    for (index, doc) in container.child.iter().enumerate() {
        apps.push(
            index,
            app_from_doc(doc).map_err(|e| (non_empty(doc.docid.as_deref()), e)),
        );
    }

    let next = container
        .container_metadata
        .as_ref()
        .and_then(|m| non_empty(m.next_page_url.as_deref()));
    Ok((apps, next))
}

pub fn parse_purchase(wrapper: &ResponseWrapper) -> Result<String, ParseError> {
    payload(wrapper)?
        .buy_response
        .as_ref()
        .and_then(|b| non_empty(b.download_token.as_deref()))
        .ok_or_else(|| ParseError::missing("buyResponse.downloadToken"))
}

pub fn parse_delivery(
    wrapper: &ResponseWrapper,
    package: &str,
    version_code: u64,
) -> Result<Delivery, ParseError> {
    let data = payload(wrapper)?
        .delivery_response
        .as_ref()
        .and_then(|d| d.app_delivery_data.as_ref())
        .ok_or_else(|| ParseError::missing_in("appDeliveryData", package))?;
    // An empty download URL means the app was never purchased.
    let download_url = non_empty(data.download_url.as_deref())
        .ok_or_else(|| ParseError::missing_in("download_url", package))?;

    let cookies = data
        .download_auth_cookie
        .iter()
        .filter_map(|c| {
            Some(DownloadCookie {
                name: non_empty(c.name.as_deref())?,
                value: c.value.clone().unwrap_or_default(),
            })
        })
        .collect();

    let splits = data
        .split
        .iter()
        .filter_map(|s| {
            Some(SplitApk {
                name: non_empty(s.id.as_deref())?,
                download_url: non_empty(s.download_url.as_deref())?,
            })
        })
        .collect();

    let mut additional_files = Vec::with_capacity(data.additional_file.len());
    for file in &data.additional_file {
        let kind = match file.file_type.unwrap_or_default() {
            0 => ObbKind::Main,
            1 => ObbKind::Patch,
            other => {
                return Err(ParseError::format(format!(
                    "unknown additional file type {} for {}",
                    other, package
                )))
            }
        };
        let download_url = non_empty(file.download_url.as_deref())
            .ok_or_else(|| ParseError::missing_in("additional_file.download_url", package))?;
        additional_files.push(AdditionalFile {
            kind,
            version_code: file
                .version_code
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(version_code),
            download_url,
        });
    }

    Ok(Delivery {
        package: package.to_string(),
        version_code,
        download_url,
        cookies,
        splits,
        additional_files,
    })
}

/// `Error=` values that refuse the account itself; retrying with the same
/// credentials cannot succeed.
const ACCOUNT_REFUSALS: &[&str] = &[
    "BadAuthentication",
    "NeedsBrowser",
    "NotVerified",
    "TermsNotAgreed",
    "CaptchaRequired",
    "AccountDeleted",
    "AccountDisabled",
];

/// Parse the `Key=value` lines of an `auth` reply. Keys are lowercased.
///
/// An `Error` line fails the login: account refusals become
/// `UpstreamRejected`, `ServiceUnavailable` an exchange failure, anything
/// else `InvalidCredentials`.
pub fn parse_auth_response(body: &str) -> Result<HashMap<String, String>, AuthError> {
    let mut fields = HashMap::new();
    for line in body.lines() {
        if let Some((key, value)) = line.split_once('=') {
            fields.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }
    match fields.get("error").map(String::as_str) {
        None => Ok(fields),
        Some(error) if ACCOUNT_REFUSALS.contains(&error) => {
            Err(AuthError::UpstreamRejected(error.to_string()))
        }
        Some("ServiceUnavailable") => Err(AuthError::exchange(ClientError::ServerBusy(
            "ServiceUnavailable".to_string(),
        ))),
        Some(error) => Err(AuthError::InvalidCredentials(error.to_string())),
    }
}

/// Pull one named token out of a parsed `auth` reply.
pub fn auth_token(fields: &HashMap<String, String>, name: &'static str) -> Result<String, AuthError> {
    fields
        .get(name)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| AuthError::exchange(ParseError::missing_in(name, "auth response")))
}

pub fn parse_checkin(body: &[u8]) -> Result<AndroidCheckinResponse, ParseError> {
    AndroidCheckinResponse::decode(body)
        .map_err(|e| ParseError::format(format!("undecodable checkin response: {}", e)))
}

pub fn parse_device_config_token(wrapper: &ResponseWrapper) -> Option<String> {
    wrapper
        .payload
        .as_ref()
        .and_then(|p| p.upload_device_config_response.as_ref())
        .and_then(|r| non_empty(r.upload_device_config_token.as_deref()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Protobuf replies assembled in code.

    use super::super::proto::*;

    pub fn app_doc(id: &str, title: Option<&str>, version: &str, version_code: i32) -> DocV2 {
        DocV2 {
            docid: Some(id.to_string()),
            title: title.map(str::to_string),
            creator: Some("Example Inc.".into()),
            details: Some(DocumentDetails {
                app_details: Some(AppDetails {
                    version_code: Some(version_code),
                    version_string: Some(version.to_string()),
                    package_name: Some(id.to_string()),
                    app_category: vec!["TOOLS".into()],
                    installation_size: Some(2_048),
                    ..Default::default()
                }),
            }),
            offer: vec![Offer {
                offer_type: Some(1),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    pub fn wrap(payload: Payload) -> ResponseWrapper {
        ResponseWrapper {
            payload: Some(payload),
            ..Default::default()
        }
    }

    pub fn details(doc: DocV2) -> ResponseWrapper {
        wrap(Payload {
            details_response: Some(DetailsResponse { doc_v2: Some(doc) }),
            ..Default::default()
        })
    }

    pub fn list(apps: Vec<DocV2>, next_page_url: Option<&str>) -> ResponseWrapper {
        named_list("apps_topselling_free", "Top Free", apps, next_page_url)
    }

    pub fn named_list(
        id: &str,
        title: &str,
        apps: Vec<DocV2>,
        next_page_url: Option<&str>,
    ) -> ResponseWrapper {
        let container = DocV2 {
            docid: Some(id.to_string()),
            title: Some(title.to_string()),
            child: apps,
            container_metadata: Some(ContainerMetadata {
                next_page_url: next_page_url.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        };
        wrap(Payload {
            list_response: Some(ListResponse {
                doc: vec![DocV2 {
                    child: vec![container],
                    ..Default::default()
                }],
            }),
            ..Default::default()
        })
    }

    pub fn error_reply(message: &str) -> ResponseWrapper {
        ResponseWrapper {
            commands: Some(ServerCommands {
                display_error_message: Some(message.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::proto::*;
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_details() {
        let app = parse_details(&details(app_doc("com.example.app", Some("Example"), "1.2", 12))).unwrap();
        assert_eq!(app.id, "com.example.app");
        assert_eq!(app.name, "Example");
        assert_eq!(app.version, "1.2");
        assert_eq!(app.version_code, 12);
        assert_eq!(app.store, Store::GooglePlay);
        assert_eq!(app.creator.as_deref(), Some("Example Inc."));
        assert_eq!(app.size, Some(2_048));
        assert_eq!(app.category.as_deref(), Some("TOOLS"));
        assert_eq!(app.offer_type, Some(1));
    }

    #[test]
    fn test_details_missing_name() {
        let err = parse_details(&details(app_doc("com.example.app", None, "1.2", 12))).unwrap_err();
        assert_eq!(err, ParseError::missing_in("name", "com.example.app"));
    }

    #[test]
    fn test_details_survive_decode_roundtrip_with_unknown_fields() {
        let mut bytes = details(app_doc("com.example.app", Some("Example"), "1.2", 12)).encode_to_vec();
        // Field 99, varint 1: a field this crate does not know.
        bytes.extend_from_slice(&[0x98, 0x06, 0x01]);
        let wrapper = parse_wrapper(&bytes).unwrap();
        assert_eq!(parse_details(&wrapper).unwrap().name, "Example");
    }

    #[test]
    fn test_garbage_is_unexpected_format() {
        assert!(matches!(
            parse_wrapper(&[0xff, 0xff, 0xff]),
            Err(ParseError::UnexpectedFormat(_))
        ));
    }

    #[test]
    fn test_server_error_message() {
        assert_eq!(server_error(&error_reply("Item not found.")), Some("Item not found."));
        assert_eq!(server_error(&error_reply("  ")), None);
        assert_eq!(server_error(&ResponseWrapper::default()), None);
    }

    #[test]
    fn test_app_page_isolates_bad_item() {
        let wrapper = list(
            vec![
                app_doc("com.example.one", Some("One"), "1.0", 1),
                app_doc("com.example.two", None, "2.0", 2),
                app_doc("com.example.three", Some("Three"), "3.0", 3),
            ],
            Some("list?c=3&ctr=apps_topselling_free&o=100"),
        );

        let (apps, next) = parse_app_page(&wrapper).unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps.errors.len(), 1);
        assert_eq!(apps.errors[0].index, 1);
        assert_eq!(apps.errors[0].id.as_deref(), Some("com.example.two"));
        assert_eq!(next.as_deref(), Some("list?c=3&ctr=apps_topselling_free&o=100"));
    }

    #[test]
    fn test_app_page_without_next_url() {
        let (_, next) = parse_app_page(&list(vec![], Some(""))).unwrap();
        assert_eq!(next, None);
    }

    #[test]
    fn test_categories_fall_back_to_cat_param() {
        let wrapper = wrap(Payload {
            browse_response: Some(BrowseResponse {
                category: vec![
                    BrowseLink {
                        name: Some("Games".into()),
                        data_url: Some("browse?c=3&cat=GAME".into()),
                        unknown_category_container: None,
                    },
                    BrowseLink {
                        name: Some("Tools".into()),
                        data_url: Some("browse?c=3&cat=TOOLS".into()),
                        unknown_category_container: Some(UnknownCategoryContainer {
                            category_id_container: Some(CategoryIdContainer {
                                category_id: Some("TOOLS_ID".into()),
                            }),
                        }),
                    },
                    BrowseLink {
                        name: Some("Broken".into()),
                        data_url: None,
                        unknown_category_container: None,
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        });

        let categories = parse_categories(&wrapper).unwrap();
        assert_eq!(categories.records[0].id, "GAME");
        assert_eq!(categories.records[1].id, "TOOLS_ID");
        assert_eq!(categories.errors.len(), 1);
        assert_eq!(categories.errors[0].id.as_deref(), Some("Broken"));
    }

    #[test]
    fn test_subcategories_from_prefetch() {
        let parent = Category {
            id: "GAME".into(),
            name: "Games".into(),
            data_url: "browse?c=3&cat=GAME".into(),
        };
        let list_url = "list?c=3&cat=GAME&ctr=apps_topselling_free";
        let wrapper = ResponseWrapper {
            pre_fetch: vec![
                PreFetch {
                    url: Some(list_url.into()),
                    response: Some(list(vec![], None).encode_to_vec()),
                },
                PreFetch {
                    url: Some("browse?c=3&cat=GAME&section=1".into()),
                    response: None,
                },
            ],
            ..Default::default()
        };

        let subs = parse_subcategories(&wrapper, &parent);
        assert!(subs.is_complete());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs.records[0].id, "apps_topselling_free");
        assert_eq!(subs.records[0].name, "Top Free");
        assert_eq!(subs.records[0].data_url, list_url);
        assert_eq!(subs.records[0].display_name(), "Games - Top Free");
    }

    #[test]
    fn test_delivery() {
        let wrapper = wrap(Payload {
            delivery_response: Some(DeliveryResponse {
                status: Some(1),
                app_delivery_data: Some(AndroidAppDeliveryData {
                    download_url: Some("https://play.example.org/apk".into()),
                    download_auth_cookie: vec![HttpCookie {
                        name: Some("MarketDA".into()),
                        value: Some("123".into()),
                    }],
                    split: vec![SplitDeliveryData {
                        id: Some("config.en".into()),
                        download_url: Some("https://play.example.org/split".into()),
                        ..Default::default()
                    }],
                    additional_file: vec![AppFileMetadata {
                        file_type: Some(1),
                        version_code: Some(30),
                        download_url: Some("https://play.example.org/obb".into()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            }),
            ..Default::default()
        });

        let delivery = parse_delivery(&wrapper, "com.example.app", 31).unwrap();
        assert_eq!(delivery.download_url, "https://play.example.org/apk");
        assert_eq!(delivery.cookies[0].name, "MarketDA");
        assert_eq!(delivery.splits[0].name, "config.en");
        assert_eq!(
            delivery.additional_files[0].file_name("com.example.app"),
            "patch.30.com.example.app.obb"
        );
    }

    #[test]
    fn test_delivery_without_url_is_missing_field() {
        let wrapper = wrap(Payload {
            delivery_response: Some(DeliveryResponse {
                status: Some(3),
                app_delivery_data: Some(AndroidAppDeliveryData::default()),
            }),
            ..Default::default()
        });
        assert_eq!(
            parse_delivery(&wrapper, "com.example.app", 1).unwrap_err(),
            ParseError::missing_in("download_url", "com.example.app")
        );
    }

    #[test]
    fn test_auth_response() {
        let fields = parse_auth_response("SID=x\nAuth=abc\nExpiry=1700000000\n").unwrap();
        assert_eq!(auth_token(&fields, "auth").unwrap(), "abc");
        assert_eq!(fields.get("expiry").map(String::as_str), Some("1700000000"));
        assert!(matches!(
            auth_token(&fields, "token"),
            Err(AuthError::Exchange(_))
        ));

        assert!(matches!(
            parse_auth_response("Error=BadAuthentication\n"),
            Err(AuthError::UpstreamRejected(reason)) if reason == "BadAuthentication"
        ));
    }

    #[test]
    fn test_auth_errors_only_reject_the_account_when_it_is_refused() {
        assert!(matches!(
            parse_auth_response("Error=NeedsBrowser\nUrl=https://accounts.google.com/\n"),
            Err(AuthError::UpstreamRejected(reason)) if reason == "NeedsBrowser"
        ));
        assert!(matches!(
            parse_auth_response("Error=ServiceUnavailable\n"),
            Err(AuthError::Exchange(inner)) if matches!(*inner, ClientError::ServerBusy(_))
        ));
        assert!(matches!(
            parse_auth_response("Error=Unknown\n"),
            Err(AuthError::InvalidCredentials(reason)) if reason == "Unknown"
        ));
    }
}
