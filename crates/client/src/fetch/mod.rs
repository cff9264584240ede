//! HTTP fetch pipeline for the phrasebook's own assets.
//!
//! ### Requests
//! - Every request names its destination (document, JSON, script, ...),
//!   which decides the offline fallback.
//! - URLs are canonicalized before they are used as cache keys.
//!
//! ### Responses
//! - Non-2xx statuses are responses, not errors; callers decide.
//! - Transport failures map to `HTTP_ERROR`, timeouts to `FETCH_TIMEOUT`.
//! - Max body bytes: 5MB (configurable)

pub mod url;

use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize, parse_origin, resolve, same_origin};

use eikan_core::{AppConfig, CachedResponse, Error};

/// What a request is for, mirroring the browser's request destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// A navigation; gets the offline page when the network is down.
    Document,
    Json,
    Script,
    Style,
    Image,
    Other,
}

impl Destination {
    /// Guess the destination from the URL path. A last segment without an
    /// extension is a navigation.
    pub fn from_path(path: &str) -> Self {
        let file = path.rsplit('/').next().unwrap_or_default();
        match file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            Some(ext) => match ext.as_str() {
                "html" | "htm" => Self::Document,
                "json" => Self::Json,
                "js" | "mjs" => Self::Script,
                "css" => Self::Style,
                "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" => Self::Image,
                _ => Self::Other,
            },
            None => Self::Document,
        }
    }
}

/// A request for one asset.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
}

impl AssetRequest {
    /// GET request with the destination guessed from the path.
    pub fn get(url: Url) -> Self {
        let destination = Destination::from_path(url.path());
        Self { method: Method::GET, url, destination }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }
}

/// Response to an asset request, from the network or the cache.
#[derive(Debug, Clone)]
pub struct AssetResponse {
    /// The URL the response belongs to (after redirects, for network responses)
    pub url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body bytes
    pub bytes: Bytes,
}

impl AssetResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Storable copy of this response, keyed by `key_url`.
    pub fn to_cached(&self, key_url: &Url) -> CachedResponse {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        CachedResponse {
            url: key_url.to_string(),
            status_code: self.status.as_u16(),
            content_type: self.content_type.clone(),
            headers,
            body: self.bytes.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild a response from a stored entry.
    ///
    /// Headers that are no longer valid are dropped.
    pub fn from_cached(cached: CachedResponse) -> Result<Self, Error> {
        let url = canonicalize(&cached.url)?;
        let status = StatusCode::from_u16(cached.status_code)
            .map_err(|e| Error::HttpError(format!("cached status {}: {e}", cached.status_code)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &cached.headers {
            if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                headers.append(name, value);
            }
        }

        Ok(Self { url, status, content_type: cached.content_type, headers, bytes: Bytes::from(cached.body) })
    }
}

/// Anything that can answer an asset request: the network, or the offline
/// cache controller sitting in front of it.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "eikan/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "eikan/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// Plain HTTP client.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn too_large(&self, len: usize) -> Error {
        Error::FetchTooLarge(format!("{len} bytes exceeds {}", self.config.max_bytes))
    }
}

fn transport_error(url: &Url, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::HttpError(format!("network error for {url}: {err}"))
    }
}

#[async_trait::async_trait]
impl Fetcher for FetchClient {
    /// Fetch one asset, enforcing the byte limit.
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, Error> {
        let start = Instant::now();
        let url = canonicalize(request.url.as_str())?;

        let accept = match request.destination {
            Destination::Document => "text/html,application/xhtml+xml,*/*;q=0.8",
            Destination::Json => "application/json,*/*;q=0.8",
            _ => "*/*",
        };

        let response = self
            .http
            .request(request.method.clone(), url.as_str())
            .header(header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| transport_error(&url, &e))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(self.too_large(len as usize));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response.bytes().await.map_err(|e| transport_error(&url, &e))?;
        if bytes.len() > self.config.max_bytes {
            return Err(self.too_large(bytes.len()));
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            bytes = bytes.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched asset"
        );

        Ok(AssetResponse { url: final_url, status, content_type, headers, bytes })
    }
}
