//! Renders product catalogs into paginated PDF documents.
//!
//! A [Catalog] is exported by an [Exporter]: every image it references is fetched
//! and normalized concurrently, the catalog is laid out onto pages by the
//! [layout] engine, and the resulting [Document] is rendered with `pdf-writer`.
//! Images that can't be used are left out rather than failing the export.

mod colour;
pub use colour::*;

pub mod config;
pub use config::{ExportConfig, Labels, LayoutMetrics};

mod content;

mod document;
pub use document::*;

pub mod embed;
pub use embed::EmbeddedImage;

mod error;
pub use error::*;

pub mod export;
pub use export::{Composed, Exporter};

mod font;
pub use font::*;

mod image;
pub use self::image::*;

mod info;
pub use info::*;

/// Placement of header and product blocks on pages
pub mod layout;

pub mod model;
pub use model::{Catalog, CatalogSummary, Palette, Product};

pub mod normalize;

mod page;
pub use page::*;

pub mod pagesize;

mod rect;
pub use rect::*;

pub(crate) mod refs;

pub mod sink;

mod slot;
pub use slot::*;

pub mod source;

pub mod store;

mod units;
pub use units::*;

/// Re-export PDF-writer functionality
pub use pdf_writer;
