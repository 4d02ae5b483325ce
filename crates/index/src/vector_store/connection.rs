//! Qdrant endpoint parsing.
//!
//! Users type the endpoint in many shapes: a full URL, `host:port`, a bare
//! host, or nothing at all. Parsing never fails; anything unrecognisable is
//! treated as a literal host name.

use crate::constants::{DEFAULT_QDRANT_HOST, DEFAULT_QDRANT_PORT};
use std::fmt;
use url::Url;

const HTTP_PORT: u16 = 80;
const HTTPS_PORT: u16 = 443;

/// Connection parameters derived from a raw endpoint string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub is_secure: bool,
    /// Path prefix without trailing slashes; `None` for the root.
    pub path_prefix: Option<String>,
}

impl ConnectionParams {
    /// Parse an endpoint. `None`, empty and whitespace-only input select
    /// `localhost:6333`.
    pub fn parse(raw: Option<&str>) -> Self {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return Self::plain(DEFAULT_QDRANT_HOST, DEFAULT_QDRANT_PORT);
        }

        if trimmed.contains("://") {
            return match Url::parse(trimmed) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {
                    Self::from_url(&url).unwrap_or_else(|| Self::plain(trimmed, HTTP_PORT))
                }
                _ => Self::plain(trimmed, HTTP_PORT),
            };
        }

        // `host` or `host:port`
        match Url::parse(&format!("http://{}", trimmed)) {
            Ok(url) => Self::from_url(&url).unwrap_or_else(|| Self::plain(trimmed, HTTP_PORT)),
            Err(_) => Self::plain(trimmed, HTTP_PORT),
        }
    }

    fn plain(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            is_secure: false,
            path_prefix: None,
        }
    }

    fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str().filter(|h| !h.is_empty())?;
        let is_secure = url.scheme() == "https";
        let default_port = if is_secure { HTTPS_PORT } else { HTTP_PORT };

        Some(Self {
            host: host.to_string(),
            port: url.port().unwrap_or(default_port),
            is_secure,
            path_prefix: normalize_prefix(url.path()),
        })
    }

    pub fn scheme(&self) -> &'static str {
        if self.is_secure {
            "https"
        } else {
            "http"
        }
    }

    /// Base URL for REST calls, port always explicit.
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme(),
            self.host,
            self.port,
            self.path_prefix.as_deref().unwrap_or("")
        )
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

fn normalize_prefix(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ConnectionParams {
        ConnectionParams::parse(Some(raw))
    }

    #[test]
    fn test_https_defaults_to_443() {
        let params = parse("https://qdrant.example.com");
        assert_eq!(params.host, "qdrant.example.com");
        assert_eq!(params.port, 443);
        assert!(params.is_secure);
        assert_eq!(params.path_prefix, None);
    }

    #[test]
    fn test_http_defaults_to_80() {
        let params = parse("http://qdrant.example.com");
        assert_eq!(params.port, 80);
        assert!(!params.is_secure);
    }

    #[test]
    fn test_explicit_ports_win() {
        assert_eq!(parse("https://qdrant.example.com:8443").port, 8443);
        assert_eq!(parse("http://localhost:6333").port, 6333);
        let params = parse("localhost:6333");
        assert_eq!((params.host.as_str(), params.port), ("localhost", 6333));
        assert!(!params.is_secure);
    }

    #[test]
    fn test_bare_hosts_and_ips() {
        let params = parse("qdrant.local");
        assert_eq!((params.host.as_str(), params.port), ("qdrant.local", 80));
        assert!(!params.is_secure);

        let ip = parse("192.168.1.100");
        assert_eq!((ip.host.as_str(), ip.port), ("192.168.1.100", 80));

        let ip_port = parse("192.168.1.100:6333");
        assert_eq!((ip_port.host.as_str(), ip_port.port), ("192.168.1.100", 6333));
    }

    #[test]
    fn test_blank_input_uses_local_default() {
        for raw in [None, Some(""), Some("   ")] {
            let params = ConnectionParams::parse(raw);
            assert_eq!(params.host, "localhost");
            assert_eq!(params.port, 6333);
            assert!(!params.is_secure);
            assert_eq!(params.base_url(), "http://localhost:6333");
        }
    }

    #[test]
    fn test_invalid_input_is_a_literal_host() {
        let params = parse("invalid-url-format");
        assert_eq!(params.host, "invalid-url-format");
        assert_eq!(params.port, 80);
        assert_eq!(params.base_url(), "http://invalid-url-format:80");
    }

    #[test]
    fn test_path_prefix() {
        assert_eq!(parse("http://localhost:6333/").path_prefix, None);
        assert_eq!(parse("http://localhost:6333/a/b/").path_prefix.as_deref(), Some("/a/b"));
        assert_eq!(parse("https://host/api///").path_prefix.as_deref(), Some("/api"));
        assert_eq!(
            parse("https://host/api/path/?key=value#frag").path_prefix.as_deref(),
            Some("/api/path")
        );
    }

    #[test]
    fn test_base_url_includes_prefix() {
        let params = parse("https://cloud.qdrant.io/cluster-1/");
        assert_eq!(params.base_url(), "https://cloud.qdrant.io:443/cluster-1");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let raw = "https://qdrant.example.com:8443/prefix";
        assert_eq!(parse(raw), parse(raw));
    }
}
