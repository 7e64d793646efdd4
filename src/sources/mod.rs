//! HTTP listing sources.

pub mod http;
pub mod metacritic;
pub mod selectors;
pub mod steam;

pub use http::HttpFetcher;
pub use metacritic::MetacriticBrowse;
pub use steam::SteamStore;

/// Scheme and host of `url`, e.g. `https://www.metacritic.com`.
pub fn origin(url: &str) -> &str {
    let Some(scheme_end) = url.find("://") else {
        return url;
    };
    let host_start = scheme_end + 3;
    match url[host_start..].find(['/', '?', '#']) {
        Some(end) => &url[..host_start + end],
        None => url,
    }
}

/// Resolves a possibly relative `href` against `origin`.
pub fn resolve_url(origin: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        let scheme = origin.split("://").next().unwrap_or("https");
        format!("{}://{}", scheme, rest)
    } else if href.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", origin.trim_end_matches('/'), href)
    }
}

/// Substitutes `{name}` placeholders in an endpoint template.
pub(crate) fn fill_template(template: &str, params: &[(&str, String)]) -> String {
    params.iter().fold(template.to_string(), |url, (name, value)| {
        url.replace(&format!("{{{}}}", name), value)
    })
}
