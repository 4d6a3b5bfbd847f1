use super::{
    extractor::Extractor,
    types::{is_media_url, MediaRecord, MediaSource},
};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[content]").expect("meta selector is valid"));

const VIDEO_PROPERTIES: &[&str] = &["og:video", "og:video:url", "og:video:secure_url"];
const IMAGE_PROPERTIES: &[&str] = &["og:image", "og:image:url", "og:image:secure_url"];

/// Falls back to the Open Graph `<meta>` tags every post page carries for link previews.
pub struct OpenGraphExtractor;

impl OpenGraphExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for OpenGraphExtractor {
    fn name(&self) -> &'static str {
        "og-meta"
    }

    fn extract(&self, html: &str) -> Option<MediaRecord> {
        let tags = collect_tags(html, &META_SELECTOR);
        debug!("Found {} Open Graph tags", tags.len());

        let image = first_content(&tags, IMAGE_PROPERTIES);

        if let Some(video) = first_content(&tags, VIDEO_PROPERTIES) {
            return Some(MediaRecord::video(
                video,
                image.unwrap_or_default(),
                MediaSource::OgMeta,
            ));
        }

        image.map(|url| MediaRecord::image(url, MediaSource::OgMeta))
    }
}

/// `(property, content)` pairs for every `og:` meta tag, in document order.
///
/// Attribute values come back with HTML entities already decoded.
fn collect_tags(html: &str, selector: &Selector) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .filter_map(|element| {
            let el = element.value();
            let property = el.attr("property").or_else(|| el.attr("name"))?;
            let property = property.trim().to_ascii_lowercase();
            if !property.starts_with("og:") {
                return None;
            }
            let content = el.attr("content")?.trim().to_string();
            Some((property, content))
        })
        .collect()
}

/// First usable URL for the earliest-listed property name that has one.
///
/// Empty, relative and non-http(s) values are skipped.
fn first_content<'a>(tags: &'a [(String, String)], properties: &[&str]) -> Option<&'a str> {
    properties.iter().find_map(|wanted| {
        tags.iter()
            .find(|(property, content)| property == wanted && is_media_url(content))
            .map(|(_, content)| content.as_str())
    })
}
