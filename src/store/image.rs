//! Image reference resolution
//!
//! Asset references are self-describing (`image-<id>-<w>x<h>-<format>`), so
//! turning one into a CDN URL needs no network call.

use lazy_static::lazy_static;
use regex::Regex;

use crate::content::ImageRef;

const CDN_HOST: &str = "https://cdn.sanity.io";

lazy_static! {
    static ref ASSET_REF: Regex =
        Regex::new(r"^image-([A-Za-z0-9_]+)-(\d+)x(\d+)-([A-Za-z0-9]+)$").unwrap();
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("image has no asset")]
    MissingAsset,

    #[error("malformed image reference: {0}")]
    MalformedReference(String),
}

/// Builds CDN URLs for image references of one project/dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
    width: Option<u32>,
}

impl ImageUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
            width: None,
        }
    }

    /// Same builder, requesting images scaled to `width` pixels
    pub fn width(&self, width: u32) -> Self {
        Self {
            width: Some(width),
            ..self.clone()
        }
    }

    /// Resolve an image field to a fetchable URL
    pub fn resolve(&self, image: &ImageRef) -> Result<String, ImageError> {
        let asset = image.asset.as_ref().ok_or(ImageError::MissingAsset)?;

        let base = match (&asset.url, &asset.reference) {
            (Some(url), _) => url.clone(),
            (None, Some(reference)) => self.asset_url(reference)?,
            (None, None) => return Err(ImageError::MissingAsset),
        };

        Ok(match self.width {
            Some(w) if base.contains('?') => format!("{}&w={}", base, w),
            Some(w) => format!("{}?w={}", base, w),
            None => base,
        })
    }

    /// Resolve an optional image, logging and returning "" when it can't be
    pub fn resolve_or_empty(&self, image: Option<&ImageRef>) -> String {
        match image.map(|i| self.resolve(i)) {
            Some(Ok(url)) => url,
            Some(Err(e)) => {
                tracing::debug!("Unresolvable image: {}", e);
                String::new()
            }
            None => String::new(),
        }
    }

    fn asset_url(&self, reference: &str) -> Result<String, ImageError> {
        let caps = ASSET_REF
            .captures(reference)
            .ok_or_else(|| ImageError::MalformedReference(reference.to_string()))?;

        Ok(format!(
            "{}/images/{}/{}/{}-{}x{}.{}",
            CDN_HOST, self.project_id, self.dataset, &caps[1], &caps[2], &caps[3], &caps[4]
        ))
    }
}
