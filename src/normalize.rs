//! Image normalization: fetch an image in whatever encoding it comes in, decode
//! it, and re-encode it as PNG, the one format the rest of the pipeline handles.

use crate::slot::ImageSlot;
use crate::source::{FetchError, ImageSource};
use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat};
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("resource body is empty")]
    Empty,

    #[error("failed to decode {format:?} image: {source}")]
    Decode {
        format: ImageFormat,
        source: image::ImageError,
    },

    #[error("failed to encode PNG: {0}")]
    Encode(image::ImageError),

    #[error("decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// An image re-encoded as PNG, with its natural size in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Pick the decoder for a resource: a recognised declared media type wins, then the
/// extension of the URI's path, and PNG when neither says anything useful
pub fn resolve_format(uri: &str, content_type: Option<&str>) -> ImageFormat {
    if let Some(format) = content_type.and_then(format_from_media_type) {
        return format;
    }

    let path = uri.split(['?', '#']).next().unwrap_or_default();
    let extension = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    extension
        .as_deref()
        .and_then(format_from_extension)
        .unwrap_or(ImageFormat::Png)
}

fn format_from_media_type(media_type: &str) -> Option<ImageFormat> {
    let media_type = media_type.to_ascii_lowercase();
    if media_type.contains("png") {
        Some(ImageFormat::Png)
    } else if media_type.contains("jpeg") || media_type.contains("jpg") {
        Some(ImageFormat::Jpeg)
    } else if media_type.contains("bmp") {
        Some(ImageFormat::Bmp)
    } else if media_type.contains("gif") {
        Some(ImageFormat::Gif)
    } else if media_type.contains("tiff") {
        Some(ImageFormat::Tiff)
    } else {
        None
    }
}

fn format_from_extension(extension: &str) -> Option<ImageFormat> {
    match extension {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "bmp" => Some(ImageFormat::Bmp),
        "tif" | "tiff" => Some(ImageFormat::Tiff),
        "gif" => Some(ImageFormat::Gif),
        _ => None,
    }
}

/// Decode `bytes` as `format` and re-encode the result as PNG
pub fn to_canonical(bytes: &[u8], format: ImageFormat) -> Result<CanonicalImage, NormalizeError> {
    if bytes.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let decoded: DynamicImage = image::load_from_memory_with_format(bytes, format)
        .map_err(|source| NormalizeError::Decode { format, source })?;
    let (width, height) = decoded.dimensions();

    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
        .map_err(NormalizeError::Encode)?;

    Ok(CanonicalImage { png, width, height })
}

/// Fetch and normalize `uri`, reporting why it failed
pub async fn try_normalize(
    source: &dyn ImageSource,
    uri: &str,
    timeout: Option<Duration>,
) -> Result<CanonicalImage, NormalizeError> {
    let fetched = match timeout {
        Some(limit) => tokio::time::timeout(limit, source.fetch(uri))
            .await
            .map_err(|_| NormalizeError::Timeout(limit))??,
        None => source.fetch(uri).await?,
    };
    if fetched.bytes.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let format = resolve_format(uri, fetched.content_type.as_deref());
    debug!(uri, ?format, bytes = fetched.bytes.len(), "decoding image");
    tokio::task::spawn_blocking(move || to_canonical(&fetched.bytes, format)).await?
}

/// Fetch and normalize `uri`. Never fails: a missing URI is [ImageSlot::Absent]
/// straight away, and every failure is logged and also becomes `Absent`.
pub async fn normalize(
    source: &dyn ImageSource,
    uri: Option<&str>,
    timeout: Option<Duration>,
) -> ImageSlot<CanonicalImage> {
    let Some(uri) = uri.map(str::trim).filter(|u| !u.is_empty()) else {
        return ImageSlot::Absent;
    };

    match try_normalize(source, uri, timeout).await {
        Ok(image) => ImageSlot::Present(image),
        Err(error) => {
            warn!(uri, %error, "image could not be normalized, continuing without it");
            ImageSlot::Absent
        }
    }
}
