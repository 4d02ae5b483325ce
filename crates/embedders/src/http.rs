//! Shared HTTP client construction.

use codeindex_core::{AppError, AppResult};
use std::time::Duration;

/// Request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Options applied to every outbound HTTP client.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub proxy_url: Option<String>,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            proxy_url: None,
            user_agent: format!("codeindex/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpOptions {
    /// Route all requests through `proxy_url`.
    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url;
        self
    }

    /// Build a reqwest client honouring these options.
    pub fn build_client(&self) -> AppResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone());

        if let Some(ref url) = self.proxy_url {
            let proxy = reqwest::Proxy::all(url)
                .map_err(|e| AppError::Config(format!("Invalid proxy URL '{}': {}", url, e)))?;
            tracing::debug!("Routing outbound HTTP through proxy {}", url);
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| AppError::Other(format!("Failed to create HTTP client: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent() {
        let options = HttpOptions::default();
        assert!(options.user_agent.starts_with("codeindex/"));
        assert!(options.build_client().is_ok());
    }

    #[test]
    fn test_proxy_is_applied() {
        let options = HttpOptions::default().with_proxy(Some("http://127.0.0.1:3128".to_string()));
        assert!(options.build_client().is_ok());
    }
}
