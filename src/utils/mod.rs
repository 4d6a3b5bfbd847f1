use anyhow::Result;
use postgrab::media::{MediaRecord, MediaType};

/// Render a record for the terminal, either as labelled lines or one JSON object.
pub fn format_record(record: &MediaRecord, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(record)?);
    }

    let mut lines = vec![
        format!("Type: {}", record.media_type()),
        format!("URL: {}", record.url()),
    ];
    if record.media_type() == MediaType::Video && !record.thumbnail().is_empty() {
        lines.push(format!("Thumbnail: {}", record.thumbnail()));
    }
    lines.push(format!("Source: {}", record.source()));

    Ok(lines.join("\n"))
}
