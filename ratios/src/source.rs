//! Remote ratio sources.

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::debug;

use crate::config::SourceConfig;
use crate::error::{FetchError, RatioError, RatioResult};

/// Desktop browser user agent the ratio service accepts.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Raw answer from one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceResponse {
    pub status: u16,
    pub body: String,
}

impl SourceResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Trait for remote ratio sources.
#[async_trait]
pub trait RatioSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Endpoint paths, in the order they should be tried.
    fn endpoints(&self) -> &[String];

    /// Issue one request against `endpoint`.
    ///
    /// Any HTTP status is returned as `Ok`; only transport failures are errors.
    async fn fetch(&self, endpoint: &str) -> Result<SourceResponse, FetchError>;
}

/// Ratio source backed by the remote HTTP service.
#[derive(Debug, Clone)]
pub struct HttpRatioSource {
    client: Client,
    base_url: String,
    endpoints: Vec<String>,
}

impl HttpRatioSource {
    /// Build a client carrying the fixed header set and request timeout.
    pub fn new(config: &SourceConfig) -> RatioResult<Self> {
        let client = Client::builder()
            .default_headers(request_headers(config)?)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RatioError::Source(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
        })
    }

    /// Full URL for an endpoint path.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl RatioSource for HttpRatioSource {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn fetch(&self, endpoint: &str) -> Result<SourceResponse, FetchError> {
        let url = self.url_for(endpoint);
        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(url = %url, status, body = %body, "Ratio service response");
        Ok(SourceResponse { status, body })
    }
}

/// Browser-like headers plus the Origin/Referer pair the service requires.
///
/// Accept-Encoding is left to reqwest so compressed bodies are decoded.
pub fn request_headers(config: &SourceConfig) -> RatioResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("cross-site"));
    headers.insert(header::ORIGIN, header_value("Origin", &config.origin)?);
    headers.insert(header::REFERER, header_value("Referer", &config.referer)?);
    Ok(headers)
}

fn header_value(name: &str, value: &str) -> RatioResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| RatioError::Source(format!("invalid {name} header: {e}")))
}

/// Mock ratio source for testing.
///
/// Responses are scripted per endpoint and consumed in order. An endpoint
/// with nothing left to return fails with a network error.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRatioSource {
    endpoints: Vec<String>,
    scripts: dashmap::DashMap<String, std::collections::VecDeque<Result<SourceResponse, FetchError>>>,
    calls: parking_lot::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRatioSource {
    /// Create a mock with the given endpoint order.
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            scripts: dashmap::DashMap::new(),
            calls: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Create a mock with the default endpoint order.
    pub fn with_default_endpoints() -> Self {
        Self::new(crate::config::DEFAULT_ENDPOINTS)
    }

    /// Queue an HTTP response for an endpoint.
    pub fn push_response(&self, endpoint: &str, status: u16, body: impl Into<String>) -> &Self {
        self.push(endpoint, Ok(SourceResponse::new(status, body)))
    }

    /// Queue a transport failure for an endpoint.
    pub fn push_error(&self, endpoint: &str, error: FetchError) -> &Self {
        self.push(endpoint, Err(error))
    }

    fn push(&self, endpoint: &str, result: Result<SourceResponse, FetchError>) -> &Self {
        self.scripts
            .entry(endpoint.to_string())
            .or_default()
            .push_back(result);
        self
    }

    /// Endpoints requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of requests made against one endpoint.
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == endpoint).count()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RatioSource for MockRatioSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn fetch(&self, endpoint: &str) -> Result<SourceResponse, FetchError> {
        self.calls.lock().push(endpoint.to_string());
        self.scripts
            .get_mut(endpoint)
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| Err(FetchError::Network(format!("no scripted response for {endpoint}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_headers() {
        let headers = request_headers(&SourceConfig::default()).unwrap();
        assert_eq!(headers[header::ORIGIN], "http://spyconverter.com");
        assert_eq!(headers[header::REFERER], "http://spyconverter.com/");
        assert_eq!(headers[header::USER_AGENT], BROWSER_USER_AGENT);
        assert_eq!(headers["sec-fetch-mode"], "cors");
        assert!(!headers.contains_key(header::ACCEPT_ENCODING));
    }

    #[test]
    fn test_invalid_origin_rejected() {
        let config = SourceConfig {
            origin: "bad\norigin".to_string(),
            ..Default::default()
        };
        assert!(matches!(request_headers(&config), Err(RatioError::Source(_))));
    }

    #[test]
    fn test_url_joining() {
        let config = SourceConfig {
            base_url: "https://ratios.example.com/".to_string(),
            ..Default::default()
        };
        let source = HttpRatioSource::new(&config).unwrap();
        assert_eq!(source.url_for("/"), "https://ratios.example.com/");
        assert_eq!(source.url_for("/api/ratios"), "https://ratios.example.com/api/ratios");
        assert_eq!(source.endpoints().len(), 4);
    }

    #[tokio::test]
    async fn test_mock_source_scripts_in_order() {
        let source = MockRatioSource::new(["/", "/data"]);
        source.push_response("/", 503, "").push_response("/", 200, "{}");

        assert_eq!(source.fetch("/").await.unwrap().status, 503);
        assert_eq!(source.fetch("/").await.unwrap().status, 200);
        assert!(matches!(source.fetch("/").await, Err(FetchError::Network(_))));
        assert!(matches!(source.fetch("/data").await, Err(FetchError::Network(_))));

        assert_eq!(source.call_count("/"), 3);
        assert_eq!(source.calls(), vec!["/", "/", "/", "/data"]);
    }
}
