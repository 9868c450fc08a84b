//! HTML parsing of f-droid.org pages.

use scraper::{ElementRef, Html, Selector};

use crate::api::ParseError;
use crate::models::{AppInfo, Category, Partial, Store, SubCategory};
use crate::utils::{collapse_whitespace, non_empty};

/// Every F-Droid app is published by the repository itself.
pub const CREATOR: &str = "F-Droid";

fn selector(css: &'static str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::format(format!("selector {:?}: {}", css, e)))
}

fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn first_text(scope: ElementRef<'_>, css: &'static str) -> Result<Option<String>, ParseError> {
    let sel = selector(css)?;
    Ok(scope
        .select(&sel)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty()))
}

/// Package name from the final URL of a details page
/// (`https://f-droid.org/en/packages/org.example.notes/`).
pub fn package_id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    non_empty(path.trim_end_matches('/').rsplit('/').next())
}

/// Parse a package details page.
pub fn parse_package_page(html: &str, final_url: &str) -> Result<AppInfo, ParseError> {
    let document = Html::parse_document(html);
    let package_sel = selector(".package")?;
    let package = document
        .select(&package_sel)
        .next()
        .ok_or_else(|| ParseError::format(format!("no .package container at {}", final_url)))?;

    let id = package_id_from_url(final_url).ok_or_else(|| ParseError::missing("id"))?;
    let name = first_text(package, ".package-name")?
        .ok_or_else(|| ParseError::missing_in("name", &id))?;

    // The latest version header links its version name first, then its code.
    let version_sel = selector("#latest .package-version-header a[name]")?;
    let mut anchors = package
        .select(&version_sel)
        .filter_map(|a| a.value().attr("name"))
        .map(str::trim);
    let version = non_empty(anchors.next()).ok_or_else(|| ParseError::missing_in("version", &id))?;
    let raw_code = anchors
        .next()
        .ok_or_else(|| ParseError::missing_in("version_code", &id))?;
    let version_code = raw_code.parse::<u64>().map_err(|_| {
        ParseError::format(format!("version code {:?} of {} is not a number", raw_code, id))
    })?;

    let mut app = AppInfo::new(Store::FDroid, id, name, version, version_code);
    app.creator = Some(CREATOR.to_string());
    app.description_short = first_text(package, ".package-summary")?;
    let description_sel = selector(".package-description")?;
    app.description_html = package
        .select(&description_sel)
        .next()
        .map(|d| d.inner_html().trim().to_string())
        .filter(|d| !d.is_empty());
    Ok(app)
}

/// Parse `/en/packages/`: each `h3` category heading is followed by a
/// paragraph linking to the category listing.
pub fn parse_package_index(html: &str, parent: &Category) -> Result<Partial<SubCategory>, ParseError> {
    let document = Html::parse_document(html);
    let content_sel = selector(".post-content")?;
    let content = document
        .select(&content_sel)
        .next()
        .ok_or_else(|| ParseError::format("no .post-content on the package index"))?;

    let items_sel = selector("h3, p")?;
    let link_sel = selector("a[href]")?;
    let mut subcategories = Partial::default();
    let mut pending: Option<String> = None;
    let mut index = 0;

    for element in content.select(&items_sel) {
        if element.value().name() == "h3" {
            if let Some(name) = pending.take() {
                subcategories.push(index, Err((Some(name.clone()), ParseError::missing_in("data_url", name))));
                index += 1;
            }
            pending = Some(text_of(element)).filter(|n| !n.is_empty());
            continue;
        }
        let href = element
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"));
        if let (Some(href), Some(name)) = (href, pending.as_ref()) {
            let name = name.clone();
            pending = None;
            subcategories.push(
                index,
                Ok(SubCategory {
                    id: name.clone(),
                    name,
                    data_url: href.to_string(),
                    parent: parent.clone(),
                }),
            );
            index += 1;
        }
    }
    if let Some(name) = pending {
        subcategories.push(index, Err((Some(name.clone()), ParseError::missing_in("data_url", name))));
    }
    Ok(subcategories)
}

/// Links found on one category listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryListing {
    /// Site paths of package details pages, in page order.
    pub packages: Vec<String>,
    /// Site paths of the listing's further pages.
    pub pages: Vec<String>,
}

pub fn parse_category_page(html: &str) -> Result<CategoryListing, ParseError> {
    let document = Html::parse_document(html);
    let list_sel = selector("#package-list")?;
    let list = document
        .select(&list_sel)
        .next()
        .ok_or_else(|| ParseError::format("no #package-list on the category page"))?;

    let nav_sel = selector(".nav.page a[href]")?;
    let pages: Vec<String> = list
        .select(&nav_sel)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .fold(Vec::new(), |mut acc, href| {
            if !acc.contains(&href) {
                acc.push(href);
            }
            acc
        });

    let link_sel = selector("a[href]")?;
    let mut packages: Vec<String> = Vec::new();
    for href in list.select(&link_sel).filter_map(|a| a.value().attr("href")) {
        // Navigation and category links share the list with package links.
        if href.contains("/categories/") || pages.iter().any(|p| p == href) {
            continue;
        }
        if !packages.iter().any(|p| p == href) {
            packages.push(href.to_string());
        }
    }
    Ok(CategoryListing { packages, pages })
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub fn package_page(name: Option<&str>, version: &str, code: &str) -> String {
        let name = name
            .map(|n| format!(r#"<h3 class="package-name">{}</h3>"#, n))
            .unwrap_or_default();
        format!(
            r#"<html><body><div class="package">
                {name}
                <div class="package-summary"> Take   notes </div>
                <div class="package-description"><p>Simple notes.</p></div>
                <ul>
                  <li class="package-version" id="latest">
                    <div class="package-version-header">
                      <a name="{version}"></a><a name="{code}"></a>
                      Version {version} ({code})
                    </div>
                  </li>
                  <li class="package-version">
                    <div class="package-version-header"><a name="0.9"></a><a name="9"></a></div>
                  </li>
                </ul>
            </div></body></html>"#
        )
    }

    pub const PACKAGE_INDEX: &str = r#"<html><body><div class="post-content">
        <h3>Games</h3>
        <p><a href="/en/categories/games/">Show all 300 packages</a></p>
        <h3>Internet</h3>
        <p><a href="/en/categories/internet/">Show all 500 packages</a></p>
        <h3>Broken</h3>
        <h3>Science &amp; Education</h3>
        <p><a href="/en/categories/science-education/">Show all</a></p>
    </div></body></html>"#;

    pub fn category_page(packages: &[&str], pages: &[&str]) -> String {
        let links: String = packages
            .iter()
            .map(|p| format!(r#"<a class="package-header" href="/en/packages/{}/">{}</a>"#, p, p))
            .collect();
        let nav: String = pages
            .iter()
            .map(|p| format!(r#"<li class="nav page"><a href="{}">next</a></li>"#, p))
            .collect();
        format!(
            r#"<html><body><div id="package-list">{links}
                <a href="/en/categories/games/">Games</a>
                <ul class="browse-navigation">{nav}</ul>
            </div></body></html>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    const URL: &str = "https://f-droid.org/en/packages/org.example.notes/";

    fn root() -> Category {
        Category {
            id: "F-Droid".into(),
            name: "F-Droid".into(),
            data_url: String::new(),
        }
    }

    #[test]
    fn test_package_page() {
        let app = parse_package_page(&package_page(Some("Notes"), "1.2", "12"), URL).unwrap();
        assert_eq!(app.id, "org.example.notes");
        assert_eq!(app.name, "Notes");
        assert_eq!(app.version, "1.2");
        assert_eq!(app.version_code, 12);
        assert_eq!(app.store, Store::FDroid);
        assert_eq!(app.creator.as_deref(), Some("F-Droid"));
        assert_eq!(app.description_short.as_deref(), Some("Take notes"));
        assert_eq!(app.description_html.as_deref(), Some("<p>Simple notes.</p>"));
    }

    #[test]
    fn test_package_page_missing_name() {
        let err = parse_package_page(&package_page(None, "1.2", "12"), URL).unwrap_err();
        assert_eq!(err, ParseError::missing_in("name", "org.example.notes"));
    }

    #[test]
    fn test_package_page_bad_version_code() {
        let err = parse_package_page(&package_page(Some("Notes"), "1.2", "twelve"), URL).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedFormat(_)));
    }

    #[test]
    fn test_not_a_package_page() {
        let err = parse_package_page("<html><body><p>404</p></body></html>", URL).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedFormat(_)));
    }

    #[test]
    fn test_package_id_from_url() {
        assert_eq!(package_id_from_url(URL).as_deref(), Some("org.example.notes"));
        assert_eq!(
            package_id_from_url("https://f-droid.org/en/packages/org.example.notes?x=1").as_deref(),
            Some("org.example.notes")
        );
    }

    #[test]
    fn test_package_index_pairs_headings_with_links() {
        let subs = parse_package_index(PACKAGE_INDEX, &root()).unwrap();
        let names: Vec<_> = subs.records.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Games", "Internet", "Science & Education"]);
        assert_eq!(subs.records[0].data_url, "/en/categories/games/");
        assert_eq!(subs.records[0].id, "Games");
        assert_eq!(subs.errors.len(), 1);
        assert_eq!(subs.errors[0].id.as_deref(), Some("Broken"));
    }

    #[test]
    fn test_category_page_separates_packages_and_pages() {
        let html = category_page(
            &["org.example.one", "org.example.two"],
            &["/en/categories/games/2/index.html"],
        );
        let listing = parse_category_page(&html).unwrap();
        assert_eq!(
            listing.packages,
            ["/en/packages/org.example.one/", "/en/packages/org.example.two/"]
        );
        assert_eq!(listing.pages, ["/en/categories/games/2/index.html"]);
    }
}
