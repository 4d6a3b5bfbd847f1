use super::error::DownloadError;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    Http,
    Socks5,
    /// SOCKS5 with host names resolved by the proxy.
    Socks5h,
}

impl ProxyScheme {
    pub fn is_socks(&self) -> bool {
        matches!(self, Self::Socks5 | Self::Socks5h)
    }
}

impl fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Socks5 => write!(f, "socks5"),
            Self::Socks5h => write!(f, "socks5h"),
        }
    }
}

/// Proxy login, percent-decoded.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

// Keep passwords out of logs.
impl fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// An HTTP or SOCKS5 proxy, validated once when parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    scheme: ProxyScheme,
    host: String,
    port: u16,
    credentials: Option<ProxyCredentials>,
}

impl ProxyConfig {
    /// Parses `http://[user:pass@]host:port` or `socks5://[user:pass@]host:port`.
    pub fn parse(raw: &str) -> Result<Self, DownloadError> {
        let invalid = |reason: &str| DownloadError::InvalidUrl(format!("proxy {raw}: {reason}"));

        let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

        let scheme = match url.scheme() {
            "http" => ProxyScheme::Http,
            "socks5" => ProxyScheme::Socks5,
            "socks5h" => ProxyScheme::Socks5h,
            other => return Err(invalid(&format!("unsupported scheme '{other}'"))),
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host"))?
            .to_string();

        let port = url
            .port_or_known_default()
            .or(scheme.is_socks().then_some(1080))
            .ok_or_else(|| invalid("missing port"))?;

        let credentials = if url.username().is_empty() {
            None
        } else {
            let decode = |part: &str| {
                urlencoding::decode(part)
                    .map(|decoded| decoded.into_owned())
                    .map_err(|_| invalid("credentials are not valid UTF-8"))
            };
            Some(ProxyCredentials {
                username: decode(url.username())?,
                password: decode(url.password().unwrap_or_default())?,
            })
        };

        Ok(Self {
            scheme,
            host,
            port,
            credentials,
        })
    }

    pub fn scheme(&self) -> ProxyScheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn credentials(&self) -> Option<&ProxyCredentials> {
        self.credentials.as_ref()
    }

    /// Proxy address without credentials, safe to log.
    pub fn address(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Proxy address with credentials, in the form reqwest expects.
    pub(crate) fn to_url_string(&self) -> String {
        match &self.credentials {
            Some(creds) => format!(
                "{}://{}:{}@{}:{}",
                self.scheme,
                urlencoding::encode(&creds.username),
                urlencoding::encode(&creds.password),
                self.host,
                self.port
            ),
            None => self.address(),
        }
    }
}

/// A post URL plus an optional proxy, checked once at construction.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    url: Url,
    proxy: Option<ProxyConfig>,
}

impl RequestConfig {
    pub fn new(url: &str, proxy: Option<&str>) -> Result<Self, DownloadError> {
        let url = validate_post_url(url)?;
        let proxy = proxy.map(ProxyConfig::parse).transpose()?;
        Ok(Self { url, proxy })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref()
    }
}

/// Accepts only absolute http(s) URLs that name a host.
pub fn validate_post_url(raw: &str) -> Result<Url, DownloadError> {
    let url = Url::parse(raw.trim()).map_err(|_| DownloadError::InvalidUrl(raw.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DownloadError::InvalidUrl(raw.to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(DownloadError::InvalidUrl(raw.to_string())),
    }
}
