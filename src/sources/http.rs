//! Shared HTTP fetcher for listing sources.

use crate::config::Config;
use crate::error::FetchError;
use anyhow::{Context, Result};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// HTTP client with request pacing between listing pages.
pub struct HttpFetcher {
    client: Client,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { client, delay_ms: config.delay_ms, delay_jitter_ms: config.delay_jitter_ms })
    }

    /// Fetches a listing page after the configured delay.
    pub async fn get_page(&self, url: &str) -> Result<String, FetchError> {
        self.pace().await;
        self.get(url).await
    }

    /// Fetches a document without pacing.
    pub async fn get(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7")
            .header("Cache-Control", "no-cache")
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 || status == 429 {
            warn!("Rate limited ({}). Consider using a proxy or increasing delay.", status);
            return Err(FetchError::RateLimited { url: url.to_string() });
        }

        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), url: url.to_string() });
        }

        response.text().await.map_err(|e| transport_error(url, e))
    }

    /// Sleeps for the base delay plus random jitter.
    async fn pace(&self) {
        if self.delay_ms == 0 && self.delay_jitter_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

fn transport_error(url: &str, e: wreq::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else {
        FetchError::Transport { url: url.to_string(), reason: e.to_string() }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn make_test_config() -> Config {
        Config { delay_ms: 0, delay_jitter_ms: 0, ..Config::default() }
    }

    #[tokio::test]
    async fn test_get_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Hades</html>"))
            .mount(&mock_server)
            .await;

        let http = HttpFetcher::new(&make_test_config()).unwrap();
        let body = http.get_page(&format!("{}/search", mock_server.uri())).await.unwrap();
        assert!(body.contains("Hades"));
    }

    #[tokio::test]
    async fn test_rate_limited_503() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let http = HttpFetcher::new(&make_test_config()).unwrap();
        let err = http.get(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::RateLimited { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_http_error_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let http = HttpFetcher::new(&make_test_config()).unwrap();
        let err = http.get(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_retryable() {
        let http = HttpFetcher::new(&make_test_config()).unwrap();
        let err = http.get("http://127.0.0.1:1/").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_pacing_fields_from_config() {
        let config = Config { delay_ms: 1000, delay_jitter_ms: 500, ..Config::default() };
        let http = HttpFetcher::new(&config).unwrap();
        assert_eq!(http.delay_ms, 1000);
        assert_eq!(http.delay_jitter_ms, 500);
    }
}
