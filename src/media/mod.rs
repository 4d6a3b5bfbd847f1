mod error;
mod extractor;
mod fetcher;
mod json_blob;
mod og_meta;
mod proxy;
mod types;

pub use error::DownloadError;
pub use extractor::{extract, Extractor, ExtractorChain};
pub use fetcher::{Fetch, FetchSettings, HttpFetcher};
pub use proxy::{validate_post_url, ProxyConfig, ProxyCredentials, ProxyScheme, RequestConfig};
pub use types::{MediaRecord, MediaSource, MediaType};

use tracing::{info, warn};

/// Fetches a post page and runs the extraction chain over it.
pub struct MediaDownloader {
    fetcher: Box<dyn Fetch>,
    extractors: ExtractorChain,
    allowed_hosts: Vec<String>,
}

impl MediaDownloader {
    pub fn new(fetcher: Box<dyn Fetch>) -> Self {
        info!("Media downloader initialized - JSON blob first, Open Graph tags as fallback");

        Self {
            fetcher,
            extractors: ExtractorChain::default(),
            allowed_hosts: Vec::new(),
        }
    }

    /// Restrict downloads to these hosts (`www.` is ignored). Empty allows any host.
    pub fn with_allowed_hosts(mut self, hosts: Vec<String>) -> Self {
        self.allowed_hosts = hosts
            .into_iter()
            .map(|h| normalize_host(&h).to_string())
            .collect();
        self
    }

    pub async fn download(
        &self,
        url: &str,
        proxy: Option<&str>,
    ) -> Result<MediaRecord, DownloadError> {
        let request = RequestConfig::new(url, proxy)?;
        self.download_request(&request).await
    }

    pub async fn download_request(
        &self,
        request: &RequestConfig,
    ) -> Result<MediaRecord, DownloadError> {
        self.check_host(request)?;

        info!("Starting download for URL: {}", request.url());
        let html = self
            .fetcher
            .fetch(request.url(), request.proxy())
            .await
            .inspect_err(|e| warn!("Fetching {} failed: {}", request.url(), e))?;

        self.extractors
            .extract(&html)
            .inspect_err(|e| warn!("Extraction for {} failed: {}", request.url(), e))
    }

    fn check_host(&self, request: &RequestConfig) -> Result<(), DownloadError> {
        if self.allowed_hosts.is_empty() {
            return Ok(());
        }

        let host = request.url().host_str().map(normalize_host).unwrap_or("");
        if self.allowed_hosts.iter().any(|allowed| allowed == host) {
            Ok(())
        } else {
            Err(DownloadError::InvalidUrl(format!(
                "{} (host '{}' is not allowed)",
                request.url(),
                host
            )))
        }
    }
}

fn normalize_host(host: &str) -> &str {
    host.trim_start_matches("www.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use url::Url;

    struct StaticFetcher {
        html: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Fetch for StaticFetcher {
        async fn fetch(
            &self,
            _url: &Url,
            _proxy: Option<&ProxyConfig>,
        ) -> Result<String, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.html.to_string())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl Fetch for FailingFetcher {
        async fn fetch(
            &self,
            _url: &Url,
            _proxy: Option<&ProxyConfig>,
        ) -> Result<String, DownloadError> {
            Err(DownloadError::network(Some(429), "rate limited"))
        }
    }

    fn downloader(html: &'static str) -> (MediaDownloader, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = StaticFetcher {
            html,
            calls: calls.clone(),
        };
        (MediaDownloader::new(Box::new(fetcher)), calls)
    }

    #[tokio::test]
    async fn test_download_og_image() {
        let (dl, calls) =
            downloader(r#"<meta property="og:image" content="https://example.com/a.jpg">"#);
        let record = dl
            .download("https://www.instagram.com/p/ABC123/", None)
            .await
            .unwrap();
        assert_eq!(record.media_type(), MediaType::Image);
        assert_eq!(record.source(), MediaSource::OgMeta);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_skips_fetch() {
        let (dl, calls) = downloader("");
        let err = dl.download("not-a-url", None).await.unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_proxy_skips_fetch() {
        let (dl, calls) = downloader("");
        let err = dl
            .download("https://example.com/p/1/", Some("ftp://proxy:21"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_media_found() {
        let (dl, _) = downloader("<html><body>Login required</body></html>");
        let err = dl
            .download("https://example.com/p/1/", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::NoMediaFound));
    }

    #[tokio::test]
    async fn test_network_error_surfaces_unchanged() {
        let dl = MediaDownloader::new(Box::new(FailingFetcher));
        let err = dl
            .download("https://example.com/p/1/", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DownloadError::Network {
                status: Some(429),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_allowed_hosts() {
        let (dl, calls) =
            downloader(r#"<meta property="og:image" content="https://example.com/a.jpg">"#);
        let dl = dl.with_allowed_hosts(vec!["www.instagram.com".to_string()]);

        assert!(dl
            .download("https://instagram.com/p/ABC/", None)
            .await
            .is_ok());

        let err = dl
            .download("https://example.com/p/ABC/", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
