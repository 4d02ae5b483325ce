//! Proxy resolution for outbound HTTP.
//!
//! The proxy URL is resolved from the following sources, first match wins:
//! 1. An explicit value (CLI flag or settings file)
//! 2. `CODEINDEX_PROXY_URL`
//! 3. `HTTPS_PROXY`, `HTTP_PROXY`, `ALL_PROXY`

/// Environment variables consulted after the explicit value, in order.
pub const PROXY_ENV_VARS: [&str; 4] = [
    "CODEINDEX_PROXY_URL",
    "HTTPS_PROXY",
    "HTTP_PROXY",
    "ALL_PROXY",
];

/// Resolve the proxy URL from an explicit value and the process environment.
pub fn resolve_proxy_url(explicit: Option<&str>) -> Option<String> {
    resolve_proxy_url_with(explicit, |name| std::env::var(name).ok())
}

/// Resolve the proxy URL using a custom environment lookup.
pub fn resolve_proxy_url_with<F>(explicit: Option<&str>, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(str::to_string)
        .into_iter()
        .chain(PROXY_ENV_VARS.iter().filter_map(|name| lookup(name)))
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
}
