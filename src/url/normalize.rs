use crate::UrlError;
use url::Url;

/// Normalizes a URL, resolving it against `base` when it is relative
///
/// # Normalization Steps
///
/// 1. Resolve against `base` (or parse as absolute); reject if malformed
/// 2. Reject anything that is not http:// or https://
/// 3. Lowercase scheme and host, drop default ports (done by the parser)
/// 4. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
///
/// The query string is kept so the URL can still be fetched as written; it
/// does not take part in page identity (see [`page_key`]).
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize, absolute or relative
/// * `base` - The page the reference was found on, if any
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use sumi_audit::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/blog/").unwrap();
/// let url = normalize("../About/#team", Some(&base)).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/About");
/// ```
pub fn normalize(url_str: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let trimmed = url_str.trim();

    // Step 1: Parse or resolve
    let mut url = match base {
        Some(base) => base.join(trimmed),
        None => Url::parse(trimmed),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", trimmed, e)))?;

    // Step 2: Validate scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Step 3: the parser already lowercases scheme and host and drops
    // default ports; only the empty host case is left to reject
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    // Step 4: Normalize path
    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    // Step 5: Remove fragment and empty query
    url.set_fragment(None);
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// Returns the identity key of a page: scheme, host, port and path
///
/// Query and fragment are not part of the key, so `/page?a=1` and
/// `/page?a=2` are the same page for deduplication purposes.
pub fn page_key(url: &Url) -> String {
    let mut key = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        key.push_str(&format!(":{}", port));
    }
    key.push_str(&normalize_path(url.path()));
    key
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Empty segments come from repeated slashes
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}
