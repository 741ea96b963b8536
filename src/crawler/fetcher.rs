//! HTTP fetcher implementation
//!
//! This module defines the transport seam of the scanner:
//! - `HttpClient`: "make a request, get a response or an error"
//! - `ClientFactory`: hands a client to each worker slot
//! - reqwest-backed implementations of both, with proxy rotation
//! - Error classification into `ProbeErrorKind`

use crate::config::ScanSettings;
use crate::crawler::parser::is_eligible;
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Method, Proxy};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// HTTP method used for probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeMethod {
    #[default]
    Get,
    Head,
}

impl ProbeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            other => Err(format!("unsupported probe method: {}", other)),
        }
    }
}

/// Response to a single probe
#[derive(Debug, Clone, Default)]
pub struct ProbeResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Declared Content-Length
    pub content_length: Option<u64>,
    /// Location header value, unresolved
    pub location: Option<String>,
    /// Body, present only when it is worth parsing for links
    pub body: Option<Vec<u8>>,
}

impl ProbeResponse {
    /// Returns true for 3xx responses
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Classification of transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeErrorKind {
    /// The request exceeded the configured timeout
    Timeout,
    /// Connection refused, DNS failure, TLS failure
    Connect,
    /// Redirect handling failed
    Redirect,
    /// The response body could not be read
    Body,
    /// The request could not be built or sent
    Request,
    /// Anything else
    Other,
}

impl ProbeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Redirect => "redirect",
            Self::Body => "body",
            Self::Request => "request",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeError {
    pub kind: ProbeErrorKind,
    pub message: String,
}

impl ProbeError {
    pub fn new(kind: ProbeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ProbeError {}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            ProbeErrorKind::Timeout
        } else if e.is_connect() {
            ProbeErrorKind::Connect
        } else if e.is_redirect() {
            ProbeErrorKind::Redirect
        } else if e.is_body() || e.is_decode() {
            ProbeErrorKind::Body
        } else if e.is_request() || e.is_builder() {
            ProbeErrorKind::Request
        } else {
            ProbeErrorKind::Other
        };
        Self::new(kind, e.to_string())
    }
}

/// The transport used to issue probes
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issues one request and returns the response or a transport error
    ///
    /// Redirects are not followed; the `Location` header is reported
    /// instead. The body is only read for GET responses that pass
    /// [`is_eligible`].
    async fn probe(&self, method: ProbeMethod, url: &Url) -> Result<ProbeResponse, ProbeError>;

    /// GETs a text resource in full, whatever its content type
    ///
    /// Used for robots.txt, which `probe` would not read as it is not HTML.
    async fn fetch_text(&self, url: &Url) -> Result<(u16, String), ProbeError>;
}

/// Hands out the client each worker should use
pub trait ClientFactory: Send + Sync {
    /// The client for worker number `slot`
    fn client_for(&self, slot: usize) -> Arc<dyn HttpClient>;
}

/// A factory that hands the same client to every worker
impl<C: HttpClient + 'static> ClientFactory for Arc<C> {
    fn client_for(&self, _slot: usize) -> Arc<dyn HttpClient> {
        self.clone()
    }
}

/// reqwest-backed HTTP client
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn probe(&self, method: ProbeMethod, url: &Url) -> Result<ProbeResponse, ProbeError> {
        let http_method = match method {
            ProbeMethod::Get => Method::GET,
            ProbeMethod::Head => Method::HEAD,
        };

        let response = self.client.request(http_method, url.clone()).send().await?;

        let headers = response.headers();
        let header = |name| {
            headers
                .get(name)
                .and_then(|v: &reqwest::header::HeaderValue| v.to_str().ok())
                .map(|v| v.to_string())
        };

        let mut probe = ProbeResponse {
            status: response.status().as_u16(),
            content_type: header(CONTENT_TYPE),
            content_length: header(CONTENT_LENGTH).and_then(|v| v.trim().parse().ok()),
            location: header(LOCATION),
            body: None,
        };

        if method == ProbeMethod::Get
            && is_eligible(probe.content_type.as_deref(), probe.content_length)
        {
            let bytes = response.bytes().await?;
            probe.body = Some(bytes.to_vec());
        }

        Ok(probe)
    }

    async fn fetch_text(&self, url: &Url) -> Result<(u16, String), ProbeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

/// Builds an HTTP client for the scan
///
/// # Arguments
///
/// * `settings` - The scan settings (User-Agent, timeout)
/// * `proxy` - Optional proxy URL for all requests
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ConfigError)` - The proxy URL was rejected or the client failed to build
pub fn build_http_client(settings: &ScanSettings, proxy: Option<&str>) -> Result<Client, ConfigError> {
    let mut builder = Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(settings.timeout())
        .redirect(Policy::none()) // Redirect targets are reported, not followed
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        let proxy_config = Proxy::all(proxy).map_err(|e| ConfigError::InvalidProxy {
            proxy: proxy.to_string(),
            message: e.to_string(),
        })?;
        builder = builder.proxy(proxy_config);
    }

    builder
        .build()
        .map_err(|e| ConfigError::Validation(format!("Unable to build HTTP client: {}", e)))
}

/// Client factory with one reqwest client per configured proxy
///
/// Workers are assigned proxies round-robin by slot; with no proxies every
/// worker shares a single direct client.
pub struct ReqwestClientFactory {
    clients: Vec<Arc<dyn HttpClient>>,
}

impl ReqwestClientFactory {
    pub fn new(settings: &ScanSettings) -> Result<Self, ConfigError> {
        let clients: Vec<Arc<dyn HttpClient>> = if settings.proxies.is_empty() {
            vec![Arc::new(ReqwestClient::new(build_http_client(settings, None)?))]
        } else {
            settings
                .proxies
                .iter()
                .map(|proxy| {
                    let client = build_http_client(settings, Some(proxy))?;
                    Ok(Arc::new(ReqwestClient::new(client)) as Arc<dyn HttpClient>)
                })
                .collect::<Result<_, ConfigError>>()?
        };

        Ok(Self { clients })
    }

    /// Number of distinct clients (one per proxy)
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl ClientFactory for ReqwestClientFactory {
    fn client_for(&self, slot: usize) -> Arc<dyn HttpClient> {
        self.clients[slot % self.clients.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let settings = ScanSettings::default();
        assert!(build_http_client(&settings, None).is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let settings = ScanSettings::default();
        assert!(build_http_client(&settings, Some("http://127.0.0.1:8080")).is_ok());
    }

    #[test]
    fn test_factory_round_robin() {
        let settings = ScanSettings {
            proxies: vec![
                "http://127.0.0.1:8080".to_string(),
                "http://127.0.0.1:8081".to_string(),
            ],
            ..ScanSettings::default()
        };
        let factory = ReqwestClientFactory::new(&settings).unwrap();
        assert_eq!(factory.len(), 2);
        assert!(Arc::ptr_eq(&factory.client_for(0), &factory.client_for(2)));
        assert!(!Arc::ptr_eq(&factory.client_for(0), &factory.client_for(1)));
    }

    #[test]
    fn test_factory_without_proxies() {
        let factory = ReqwestClientFactory::new(&ScanSettings::default()).unwrap();
        assert_eq!(factory.len(), 1);
        assert!(Arc::ptr_eq(&factory.client_for(0), &factory.client_for(5)));
    }

    #[tokio::test]
    async fn test_fetch_text_reads_non_html_body() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /x\n"))
            .mount(&mock_server)
            .await;

        let client = ReqwestClient::new(build_http_client(&ScanSettings::default(), None).unwrap());
        let url = Url::parse(&format!("{}/robots.txt", mock_server.uri())).unwrap();

        let probed = client.probe(ProbeMethod::Get, &url).await.unwrap();
        assert_eq!(probed.status, 200);
        assert!(probed.body.is_none());

        let (status, body) = client.fetch_text(&url).await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, "User-agent: *\nDisallow: /x\n");
    }

    #[test]
    fn test_probe_method_from_str() {
        assert_eq!("get".parse::<ProbeMethod>(), Ok(ProbeMethod::Get));
        assert_eq!("HEAD".parse::<ProbeMethod>(), Ok(ProbeMethod::Head));
        assert!("POST".parse::<ProbeMethod>().is_err());
    }

    #[test]
    fn test_redirect_status() {
        let response = ProbeResponse {
            status: 301,
            ..ProbeResponse::default()
        };
        assert!(response.is_redirect());
        assert!(!ProbeResponse {
            status: 200,
            ..ProbeResponse::default()
        }
        .is_redirect());
    }
}
