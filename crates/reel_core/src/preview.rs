use url::Url;

/// Address of the backend's local range proxy.
pub const DEFAULT_PROXY_BASE: &str = "http://127.0.0.1:12345";

/// Builds the playable preview URL for a source behind the local proxy:
/// `{base}/proxy?url=<source>&referer=<origin>`, both values url-encoded.
///
/// Returns `None` when `base` is not a valid URL.
pub fn proxy_url(base: &str, source_url: &str, referer: &str) -> Option<String> {
    let mut url = Url::parse(base).ok()?.join("/proxy").ok()?;
    url.query_pairs_mut()
        .clear()
        .append_pair("url", source_url)
        .append_pair("referer", referer);
    Some(url.into())
}
