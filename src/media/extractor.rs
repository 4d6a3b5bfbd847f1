use super::{
    error::DownloadError, json_blob::JsonBlobExtractor, og_meta::OpenGraphExtractor,
    types::MediaRecord,
};
use tracing::{debug, info};

pub trait Extractor: Send + Sync {
    /// Human-readable name of the extraction stage
    fn name(&self) -> &'static str;

    /// Find a media record in the page, or `None` to let the next stage try.
    fn extract(&self, html: &str) -> Option<MediaRecord>;
}

/// Ordered extraction stages; the first stage that finds media wins and later
/// stages are never run.
pub struct ExtractorChain {
    stages: Vec<Box<dyn Extractor>>,
}

impl Default for ExtractorChain {
    fn default() -> Self {
        // Order matters: the first stage with a result wins
        let stages: Vec<Box<dyn Extractor>> = vec![
            Box::new(JsonBlobExtractor::new()),
            Box::new(OpenGraphExtractor::new()),
        ];
        Self::new(stages)
    }
}

impl ExtractorChain {
    pub fn new(stages: Vec<Box<dyn Extractor>>) -> Self {
        Self { stages }
    }

    pub fn extract(&self, html: &str) -> Result<MediaRecord, DownloadError> {
        for stage in &self.stages {
            match stage.extract(html) {
                Some(record) => {
                    info!("Extracted {} media with {}", record.media_type(), stage.name());
                    return Ok(record);
                }
                None => debug!("{} found no media", stage.name()),
            }
        }

        Err(DownloadError::NoMediaFound)
    }
}

/// Run the default two-stage extraction over a page.
pub fn extract(html: &str) -> Result<MediaRecord, DownloadError> {
    ExtractorChain::default().extract(html)
}
