//! Catalog export: fetches every image concurrently, lays the catalog out onto
//! pages, and renders the result.

use crate::colour::colours;
use crate::config::ExportConfig;
use crate::document::Document;
use crate::embed::{self, EmbeddedImage};
use crate::font::Font;
use crate::image::RasterImage;
use crate::info::Info;
use crate::layout::{catalog_blocks, lay_out, DocumentSurface, LayoutReport, LayoutStyle, Margins};
use crate::model::{Catalog, Product};
use crate::normalize::normalize;
use crate::sink::{self, CacheDirSink, DocumentSink, ShareTarget};
use crate::slot::ImageSlot;
use crate::source::{DefaultSource, ImageSource};
use crate::{ExportError, PdfError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A laid out catalog document, before it is rendered to bytes
pub struct Composed {
    pub document: Document,
    pub report: LayoutReport,
}

/// Turns catalogs into PDF documents
pub struct Exporter {
    config: ExportConfig,
    source: Arc<dyn ImageSource>,
}

impl Exporter {
    /// An exporter fetching images over HTTP(S), from local files and `data:` URIs
    pub fn new(config: ExportConfig) -> Exporter {
        Exporter::with_source(config, Arc::new(DefaultSource::new()))
    }

    pub fn with_source(config: ExportConfig, source: Arc<dyn ImageSource>) -> Exporter {
        Exporter { config, source }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    async fn load_font(&self) -> Result<Font, PdfError> {
        match &self.config.font_path {
            Some(path) => Font::load(tokio::fs::read(path).await?),
            None => Ok(Font::helvetica()),
        }
    }

    /// Build the document for `catalog` without rendering it.
    ///
    /// Only font loading can fail here; images that can't be fetched, decoded or
    /// embedded are left out of their block.
    pub async fn compose(&self, catalog: &Catalog) -> Result<Composed, ExportError> {
        if let Err(error) = catalog.validate() {
            warn!(catalog = %catalog.id, %error, "exporting a catalog that fails validation");
        }

        let mut document = Document {
            compress: self.config.compress,
            ..Document::default()
        };
        let mut info = Info::new();
        info.title(&catalog.name)
            .subject(self.config.labels.caption(catalog.products.len()));
        if let Some(updated_at) = catalog.updated_at_parsed() {
            info.creation_date(updated_at);
        }
        document.set_info(info);
        let font = document.add_font(self.load_font().await?);

        let (logo, images) = self.prepare_images(catalog).await;

        let metrics = &self.config.metrics;
        let image_box = metrics.image_box();
        let logo = embed::register(&mut document, logo, image_box);
        let images: Vec<ImageSlot<EmbeddedImage>> = images
            .into_iter()
            .map(|raster| embed::register(&mut document, raster, image_box))
            .collect();
        let embedded = images.iter().filter(|i| i.is_present()).count() + logo.is_present() as usize;

        let blocks = catalog_blocks(catalog, &self.config.labels, logo, images);
        let style = LayoutStyle {
            accent: if self.config.use_palette_accent {
                catalog.colors.primary_colour().unwrap_or(colours::BRAND_BLUE)
            } else {
                colours::BRAND_BLUE
            },
            clip_descriptions: self.config.clip_descriptions,
            ..LayoutStyle::default()
        };
        let margins = Margins::trbl(
            metrics.header_content_top,
            metrics.margin_left,
            metrics.margin_bottom,
            metrics.margin_left,
        );

        let mut surface =
            DocumentSurface::new(&mut document, self.config.page_size.size(), margins, font);
        let report = lay_out(&mut surface, metrics, style, &blocks);

        info!(
            catalog = %catalog.id,
            products = catalog.products.len(),
            images = embedded,
            pages = report.page_count(),
            "composed catalog document"
        );
        Ok(Composed { document, report })
    }

    /// Fetch, normalize and decode the logo and every product image at once.
    ///
    /// Each image runs as its own task, so a slow or failing one holds up
    /// nothing but its own slot. Results come back in catalog order. Dropping
    /// the returned future aborts every task still running.
    async fn prepare_images(
        &self,
        catalog: &Catalog,
    ) -> (ImageSlot<RasterImage>, Vec<ImageSlot<RasterImage>>) {
        let timeout = self.config.fetch_timeout();

        // slot 0 is the logo, then one slot per product
        let owners: Vec<&str> = std::iter::once(catalog.id.as_str())
            .chain(catalog.products.iter().map(|p| p.id.as_str()))
            .collect();
        let uris = std::iter::once(catalog.logo_source())
            .chain(catalog.products.iter().map(Product::image_source));

        let mut tasks = JoinSet::new();
        for (index, uri) in uris.enumerate() {
            let source = Arc::clone(&self.source);
            let uri = uri.map(str::to_string);
            tasks.spawn(async move { (index, prepare_image(source, uri, timeout).await) });
        }

        let mut slots: Vec<ImageSlot<RasterImage>> =
            owners.iter().map(|_| ImageSlot::Absent).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, raster)) => {
                    debug!(
                        owner = owners[index],
                        present = raster.is_present(),
                        "image resolved"
                    );
                    slots[index] = raster;
                }
                Err(error) => {
                    warn!(catalog = %catalog.id, %error, "image task failed, continuing without it");
                }
            }
        }

        let mut slots = slots.into_iter();
        let logo = slots.next().unwrap_or_default();
        (logo, slots.collect())
    }

    /// Render `catalog` to PDF bytes
    pub async fn export(&self, catalog: &Catalog) -> Result<Vec<u8>, ExportError> {
        let Composed { document, .. } = self.compose(catalog).await?;
        Ok(document.finish()?)
    }

    /// Render `catalog` into the configured cache directory, then hand the file
    /// to `share_target` when it is available. Returns the file's path.
    pub async fn export_to_cache(
        &self,
        catalog: &Catalog,
        share_target: &dyn ShareTarget,
    ) -> Result<PathBuf, ExportError> {
        let sink = CacheDirSink::new(&self.config.cache_dir, self.config.file_prefix.clone());
        self.export_to(catalog, &sink, share_target).await
    }

    pub async fn export_to(
        &self,
        catalog: &Catalog,
        sink: &dyn DocumentSink,
        share_target: &dyn ShareTarget,
    ) -> Result<PathBuf, ExportError> {
        let bytes = self.export(catalog).await?;
        let path = sink.persist(&bytes, &catalog.id).await?;
        let title = self.config.labels.share_title(&catalog.name);
        sink::share(share_target, &path, &title).await?;
        Ok(path)
    }
}

async fn prepare_image(
    source: Arc<dyn ImageSource>,
    uri: Option<String>,
    timeout: Option<Duration>,
) -> ImageSlot<RasterImage> {
    let canonical = normalize(source.as_ref(), uri.as_deref(), timeout).await;
    if !canonical.is_present() {
        return ImageSlot::Absent;
    }
    match tokio::task::spawn_blocking(move || embed::prepare(canonical)).await {
        Ok(raster) => raster,
        Err(error) => {
            warn!(uri = uri.as_deref().unwrap_or_default(), %error, "image decode task failed");
            ImageSlot::Absent
        }
    }
}
