use super::{
    error::DownloadError,
    proxy::ProxyConfig,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
pub trait Fetch: Send + Sync {
    /// Retrieve the page body for `url`, optionally through `proxy`.
    async fn fetch(&self, url: &Url, proxy: Option<&ProxyConfig>) -> Result<String, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Single-attempt HTTP fetcher around a caller-owned `reqwest::Client`.
///
/// Requests without a proxy reuse the client handed in at construction. A
/// proxied request gets a client built for that proxy, since reqwest binds
/// proxies at client construction.
pub struct HttpFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, settings: FetchSettings) -> Self {
        Self { client, settings }
    }

    pub fn with_settings(settings: FetchSettings) -> Result<Self, DownloadError> {
        let client = build_client(&settings, None)?;
        Ok(Self::new(client, settings))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url, proxy: Option<&ProxyConfig>) -> Result<String, DownloadError> {
        let proxied;
        let client = match proxy {
            Some(proxy) => {
                ensure_proxy_supported(proxy)?;
                info!("Routing request through proxy {}", proxy.address());
                proxied = build_client(&self.settings, Some(proxy))?;
                &proxied
            }
            None => &self.client,
        };

        debug!("GET {}", url);
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&e, self.settings.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::network(
                Some(status.as_u16()),
                describe_status(status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&e, self.settings.timeout))?;

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// SOCKS5 needs reqwest's `socks` support compiled in; refuse up front otherwise.
fn ensure_proxy_supported(proxy: &ProxyConfig) -> Result<(), DownloadError> {
    if proxy.scheme().is_socks() && !cfg!(feature = "socks") {
        return Err(DownloadError::MissingCapability(
            "SOCKS5 proxy support is not compiled in; rebuild with `--features socks`".into(),
        ));
    }
    Ok(())
}

fn build_client(
    settings: &FetchSettings,
    proxy: Option<&ProxyConfig>,
) -> Result<reqwest::Client, DownloadError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let mut builder = reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(settings.user_agent.clone())
        .default_headers(headers);

    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy.to_url_string())
            .map_err(|e| DownloadError::InvalidUrl(format!("proxy {}: {e}", proxy.address())))?;
        builder = builder.proxy(proxy);
    } else {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|e| DownloadError::network(None, format!("failed to create HTTP client: {e}")))
}

fn describe_status(code: u16) -> String {
    match code {
        404 => "Post not found. The URL may be incorrect or the post has been deleted".into(),
        403 | 429 => "Access denied or rate limited. Try again later or use a proxy".into(),
        _ => format!("HTTP error {code}"),
    }
}

fn transport_error(err: &reqwest::Error, timeout: Duration) -> DownloadError {
    let status = err.status().map(|s| s.as_u16());
    let cause = if err.is_timeout() {
        format!("request timed out after {}s", timeout.as_secs())
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    DownloadError::network(status, cause)
}
