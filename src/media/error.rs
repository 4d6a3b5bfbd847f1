use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Missing capability: {0}")]
    MissingCapability(String),
    #[error("Network error: {}", format_network(.status, .cause))]
    Network { status: Option<u16>, cause: String },
    #[error(
        "Could not extract media from this post. It may be private, deleted, \
         or the page layout has changed"
    )]
    NoMediaFound,
}

fn format_network(status: &Option<u16>, cause: &str) -> String {
    match status {
        Some(code) => format!("{cause} (HTTP {code})"),
        None => cause.to_string(),
    }
}

impl DownloadError {
    /// Only transport and HTTP failures are worth retrying at a higher level.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn network(status: Option<u16>, cause: impl Into<String>) -> Self {
        Self::Network {
            status,
            cause: cause.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_display() {
        let err = DownloadError::network(Some(404), "Post not found");
        assert_eq!(err.to_string(), "Network error: Post not found (HTTP 404)");

        let err = DownloadError::network(None, "connection refused");
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_is_retryable() {
        assert!(DownloadError::network(Some(429), "rate limited").is_retryable());
        assert!(!DownloadError::NoMediaFound.is_retryable());
        assert!(!DownloadError::InvalidUrl("x".into()).is_retryable());
        assert!(!DownloadError::MissingCapability("socks".into()).is_retryable());
    }
}
