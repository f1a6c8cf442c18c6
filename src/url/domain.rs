use url::Url;

/// Extracts the host from a URL, lowercased
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_audit::url::extract_host;
///
/// let url = Url::parse("https://Blog.Example.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the host, followed by `:port` only when the port is not the
/// scheme's default
///
/// Two URLs with the same authority are on the same site for crawl-scope
/// purposes. `http://a.com`, `http://a.com:80` and `https://a.com` all
/// compare equal, so an http to https redirect of the seed stays in scope.
pub fn authority(url: &Url) -> Option<String> {
    let host = extract_host(url)?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Returns true for hosts that answer anonymous requests with 403
///
/// These sites hide public pages behind a login wall for unknown clients,
/// so a 403 from them says nothing about whether the link is broken.
pub fn is_login_walled_host(url: &Url) -> bool {
    matches!(
        extract_host(url).as_deref(),
        Some("twitter.com" | "www.twitter.com" | "x.com" | "www.x.com")
    )
}
