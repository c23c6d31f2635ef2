use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or finalizing a PDF document
#[derive(Error, Debug)]
pub enum PdfError {
    #[error(transparent)]
    /// An I/O error occurred while rendering or writing the document
    Io(#[from] std::io::Error),

    #[error(transparent)]
    /// [owned_ttf_parser] failed to parse the font
    FaceParsingError(#[from] owned_ttf_parser::FaceParsingError),

    #[error("font is missing a required table: {0}")]
    /// The font parsed but can't be embedded
    UnusableFont(&'static str),

    #[error("page is listed in the page order but missing from the document")]
    /// A page id in the page order has no page behind it
    PageMissing,
}

/// The one failure an export can surface to its caller. Per-image problems never
/// show up here: they degrade to a block without an image instead.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to build catalog document: {0}")]
    Document(#[from] PdfError),

    #[error("failed to write catalog document to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to share {path}: {source}")]
    Share {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A catalog that can't be exported or stored as-is
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("catalog name is empty")]
    EmptyName,

    #[error("palette must hold between 1 and 3 colours, found {0}")]
    PaletteSize(usize),

    #[error("palette colour {0:?} is not a #RRGGBB or #RGB hex colour")]
    PaletteColour(String),

    #[error("product {id} has an invalid price: {price}")]
    Price { id: String, price: f64 },
}

/// Failures of the catalog persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("stored catalog data is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Failures loading an [ExportConfig](crate::ExportConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
