use serde::Serialize;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

/// Which extraction stage produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    Json,
    OgMeta,
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::OgMeta => write!(f, "og_meta"),
        }
    }
}

/// A direct media URL pulled out of a post page.
///
/// Fields are private so a record cannot change after construction; images
/// never carry a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRecord {
    #[serde(rename = "type")]
    media_type: MediaType,
    url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    thumbnail: String,
    source: MediaSource,
}

/// True when `candidate` is an absolute http(s) URL with a host.
pub(crate) fn is_media_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

impl MediaRecord {
    pub fn image(url: impl Into<String>, source: MediaSource) -> Self {
        Self {
            media_type: MediaType::Image,
            url: url.into(),
            thumbnail: String::new(),
            source,
        }
    }

    pub fn video(
        url: impl Into<String>,
        thumbnail: impl Into<String>,
        source: MediaSource,
    ) -> Self {
        Self {
            media_type: MediaType::Video,
            url: url.into(),
            thumbnail: thumbnail.into(),
            source,
        }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Empty for images and for videos without a poster.
    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    pub fn source(&self) -> MediaSource {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_has_no_thumbnail() {
        let record = MediaRecord::image("https://example.com/a.jpg", MediaSource::OgMeta);
        assert_eq!(record.media_type(), MediaType::Image);
        assert_eq!(record.thumbnail(), "");
        assert_eq!(record.source(), MediaSource::OgMeta);
    }

    #[test]
    fn test_serialize_video() {
        let record = MediaRecord::video("https://x/v.mp4", "https://x/t.jpg", MediaSource::Json);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "video",
                "url": "https://x/v.mp4",
                "thumbnail": "https://x/t.jpg",
                "source": "json"
            })
        );
    }

    #[test]
    fn test_serialize_image_omits_thumbnail() {
        let record = MediaRecord::image("https://x/a.jpg", MediaSource::OgMeta);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("thumbnail").is_none());
        assert_eq!(json["source"], "og_meta");
    }

    #[test]
    fn test_is_media_url() {
        assert!(is_media_url("https://x/v.mp4"));
        assert!(is_media_url("http://cdn.example.com/a.jpg?x=1&y=2"));
        assert!(!is_media_url("/static/a.jpg"));
        assert!(!is_media_url("not a url at all"));
        assert!(!is_media_url("javascript:alert(1)"));
        assert!(!is_media_url("data:image/png;base64,AAAA"));
        assert!(!is_media_url(""));
    }

    #[test]
    fn test_display() {
        assert_eq!(MediaType::Video.to_string(), "video");
        assert_eq!(MediaSource::OgMeta.to_string(), "og_meta");
    }
}
