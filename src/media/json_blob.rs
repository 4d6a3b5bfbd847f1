use super::{
    extractor::Extractor,
    types::{is_media_url, MediaRecord, MediaSource},
};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Script boundaries that precede an embedded data object.
static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)window\._sharedData\s*=|window\.__additionalDataLoaded\s*\(|<script\b[^>]*\btype\s*=\s*["']application/json["'][^>]*>"#,
    )
    .expect("marker regex is valid")
});

/// How far past a marker the opening brace may sit.
const MAX_LEAD: usize = 512;

#[derive(Debug, Clone, Copy)]
enum Step {
    Key(&'static str),
    Index(usize),
}

type FieldPath = &'static [Step];

/// Expected media shapes, checked in order on every object node.
#[derive(Debug)]
enum Shape {
    Video {
        url: FieldPath,
        thumbnails: &'static [FieldPath],
    },
    Image {
        url: FieldPath,
    },
}

const IMAGE_CANDIDATE: FieldPath = &[
    Step::Key("image_versions2"),
    Step::Key("candidates"),
    Step::Index(0),
    Step::Key("url"),
];

// Video shapes come first: a video node always carries a poster image too.
const SHAPES: &[Shape] = &[
    Shape::Video {
        url: &[Step::Key("video_url")],
        thumbnails: &[
            &[Step::Key("display_url")],
            &[Step::Key("thumbnail_src")],
            &[Step::Key("thumbnail_url")],
            IMAGE_CANDIDATE,
        ],
    },
    Shape::Video {
        url: &[Step::Key("video_versions"), Step::Index(0), Step::Key("url")],
        thumbnails: &[IMAGE_CANDIDATE, &[Step::Key("display_url")]],
    },
    Shape::Image {
        url: &[Step::Key("display_url")],
    },
    Shape::Image {
        url: &[Step::Key("image_url")],
    },
    Shape::Image {
        url: IMAGE_CANDIDATE,
    },
];

/// Pulls media out of the JSON data a post page embeds for client-side hydration.
pub struct JsonBlobExtractor;

impl JsonBlobExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for JsonBlobExtractor {
    fn name(&self) -> &'static str {
        "json-blob"
    }

    fn extract(&self, html: &str) -> Option<MediaRecord> {
        for blob in candidate_blobs(html) {
            let value: Value = match serde_json::from_str(blob) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Skipping malformed embedded JSON: {}", e);
                    continue;
                }
            };

            if let Some(record) = find_media(&value) {
                return Some(record);
            }
            debug!("Embedded JSON ({} bytes) has no media node", blob.len());
        }
        None
    }
}

/// Every balanced `{...}` that directly follows a marker, in document order.
///
/// A marker whose object never closes is skipped; serde_json then never sees it.
fn candidate_blobs(html: &str) -> impl Iterator<Item = &str> + '_ {
    MARKER_REGEX.find_iter(html).filter_map(move |marker| {
        let start = object_start(html, marker.end())?;
        match balanced_end(&html[start..]) {
            Some(len) => Some(&html[start..start + len]),
            None => {
                warn!("Embedded JSON at byte {} is truncated", start);
                None
            }
        }
    })
}

/// Byte offset of the first `{` after `from`, if it is close enough to belong to the marker.
fn object_start(html: &str, from: usize) -> Option<usize> {
    let lead = &html[from..];
    for (offset, c) in lead.char_indices() {
        if offset > MAX_LEAD {
            return None;
        }
        match c {
            '{' => return Some(from + offset),
            ';' | '<' => return None,
            _ => {}
        }
    }
    None
}

/// Length of the JSON object at the start of `text`, counting nested braces and
/// ignoring any inside string literals.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Depth-first walk returning the first node that matches a media shape.
fn find_media(value: &Value) -> Option<MediaRecord> {
    match value {
        Value::Object(map) => match_shape(value).or_else(|| map.values().find_map(find_media)),
        Value::Array(items) => items.iter().find_map(find_media),
        _ => None,
    }
}

fn match_shape(node: &Value) -> Option<MediaRecord> {
    SHAPES.iter().find_map(|shape| match shape {
        Shape::Video { url, thumbnails } => {
            let url = lookup_url(node, url)?;
            let thumbnail = thumbnails
                .iter()
                .find_map(|path| lookup_url(node, *path))
                .unwrap_or_default();
            Some(MediaRecord::video(url, thumbnail, MediaSource::Json))
        }
        Shape::Image { url } => {
            lookup_url(node, url).map(|url| MediaRecord::image(url, MediaSource::Json))
        }
    })
}

/// Follow `path` and return the string there if it is an absolute http(s) URL.
fn lookup_url<'a>(node: &'a Value, path: &[Step]) -> Option<&'a str> {
    let mut current = node;
    for step in path {
        current = match step {
            Step::Key(key) => current.get(key)?,
            Step::Index(index) => current.get(index)?,
        };
    }

    let candidate = current.as_str()?.trim();
    is_media_url(candidate).then_some(candidate)
}
