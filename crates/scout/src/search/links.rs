/// Query parameter DuckDuckGo uses to wrap the real destination of a result link
pub const REDIRECT_PARAM: &str = "uddg";

/// Resolve the `href` of a search result link into an absolute url to fetch.
///
/// Redirect links (`//duckduckgo.com/l/?uddg=<encoded url>&rut=...`) resolve to
/// the decoded destination. Otherwise scheme-relative links get `https:` and
/// root-relative links get the search engine `origin`. Anything else is
/// returned as is. This never fails, a link it cannot make sense of comes
/// back unchanged.
pub fn normalize_result_url(href: &str, origin: &str) -> String {
    if let Some(target) = redirect_target(href) {
        return target;
    }

    if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}

fn redirect_target(href: &str) -> Option<String> {
    let (_, query) = href.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == REDIRECT_PARAM)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|decoded| decoded.into_owned())
        .filter(|decoded| !decoded.is_empty())
}
