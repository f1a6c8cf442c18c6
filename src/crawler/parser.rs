//! HTML parser for extracting links and resources
//!
//! This module handles parsing HTML content to extract:
//! - Anchors (`<a href>`) with their text and position
//! - Sub-resources (images, scripts, stylesheets)
//! - Page title

use crate::crawler::page::{Resource, ResourceKind};
use crate::url::normalize;
use scraper::{Html, Selector};
use url::Url;

/// An anchor as found in the document, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct RawLink {
    pub href: String,
    pub text: String,
    pub position: usize,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Every anchor with a non-empty href, excluding same-page fragments
    pub links: Vec<RawLink>,

    /// Resolved resource references, duplicates removed
    pub resources: Vec<Resource>,
}

/// Parses HTML content and extracts links, resources and title
///
/// # Link Extraction Rules
///
/// **Include:**
/// - Every `<a href="...">`, whatever its scheme; classification happens later
///
/// **Exclude:**
/// - Empty hrefs
/// - Fragment-only hrefs (`#section`), which point back at the same page
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative resource references
///
/// # Example
///
/// ```
/// use sumi_audit::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].href, "/page");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document),
        resources: extract_resources(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_links(document: &Html) -> Vec<RawLink> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            if href.is_empty() || href.starts_with('#') {
                return None;
            }
            let text = element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ");
            Some((href.to_string(), text))
        })
        .enumerate()
        .map(|(position, (href, text))| RawLink {
            href,
            text,
            position,
        })
        .collect()
}

fn extract_resources(document: &Html, base_url: &Url) -> Vec<Resource> {
    let sources = [
        ("img[src]", "src", ResourceKind::Image),
        ("script[src]", "src", ResourceKind::Script),
        ("link[rel~='stylesheet'][href]", "href", ResourceKind::Stylesheet),
    ];

    let mut resources: Vec<Resource> = Vec::new();

    for (selector, attr, kind) in sources {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            let Some(value) = element.value().attr(attr) else {
                continue;
            };
            // data: URIs and other non-HTTP references fail normalization
            let Ok(url) = normalize(value, Some(base_url)) else {
                continue;
            };
            let resource = Resource { kind, url };
            if !resources.contains(&resource) {
                resources.push(resource);
            }
        }
    }

    resources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_links_keep_raw_href_text_and_position() {
        let html = r#"<html><body>
            <a href="/one">First
                link</a>
            <a href="https://other.com/two"><span>Second</span></a>
        </body></html>"#;
        let parsed = parse_html(html, &base_url());

        assert_eq!(
            parsed.links,
            vec![
                RawLink {
                    href: "/one".to_string(),
                    text: "First link".to_string(),
                    position: 0,
                },
                RawLink {
                    href: "https://other.com/two".to_string(),
                    text: "Second".to_string(),
                    position: 1,
                },
            ]
        );
    }

    #[test]
    fn test_special_schemes_are_extracted() {
        let html = r#"<html><body>
            <a href="mailto:test@example.com">Email</a>
            <a href="tel:+1234567890">Call</a>
            <a href="javascript:void(0)">JS</a>
        </body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 3);
    }

    #[test]
    fn test_skip_fragment_and_empty() {
        let html = r##"<html><body>
            <a href="#section">Jump</a>
            <a href="  ">Blank</a>
            <a>No href</a>
            <a href="/real">Real</a>
        </body></html>"##;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links.len(), 1);
        assert_eq!(parsed.links[0].href, "/real");
        assert_eq!(parsed.links[0].position, 0);
    }

    #[test]
    fn test_extract_resources() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/css/site.css">
            <link rel="icon" href="/favicon.ico">
            <script src="https://cdn.example.net/app.js"></script>
            <script>inline()</script>
        </head><body>
            <img src="img/logo.png">
            <img src="img/logo.png">
            <img src="data:image/png;base64,AAAA">
        </body></html>"#;
        let parsed = parse_html(html, &base_url());

        let found: Vec<(ResourceKind, &str)> = parsed
            .resources
            .iter()
            .map(|r| (r.kind, r.url.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (ResourceKind::Image, "https://example.com/img/logo.png"),
                (ResourceKind::Script, "https://cdn.example.net/app.js"),
                (ResourceKind::Stylesheet, "https://example.com/css/site.css"),
            ]
        );
    }
}
