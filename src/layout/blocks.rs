use crate::config::{Labels, LayoutMetrics};
use crate::embed::EmbeddedImage;
use crate::model::Catalog;
use crate::slot::ImageSlot;
use crate::units::Pt;

/// The block drawn atop every page: catalog name, product count, and logo
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderBlock {
    pub title: String,
    pub caption: String,
    pub logo: ImageSlot<EmbeddedImage>,
}

impl HeaderBlock {
    /// Distance from the top of the page at which the first block below the
    /// header starts. A logo taller than the default header pushes it down.
    pub fn content_top(&self, metrics: &LayoutMetrics) -> Pt {
        match &self.logo {
            ImageSlot::Present(logo) => metrics
                .header_content_top
                .max(metrics.logo_top + logo.height + metrics.logo_clearance),
            ImageSlot::Absent => metrics.header_content_top,
        }
    }
}

/// One product, with its text already formatted
#[derive(Debug, Clone, PartialEq)]
pub struct ProductBlock {
    pub title: String,
    pub price: String,
    pub description: Option<String>,
    pub image: ImageSlot<EmbeddedImage>,
}

impl ProductBlock {
    /// Vertical space the block claims, measured down from its title baseline
    pub fn height(&self, metrics: &LayoutMetrics) -> Pt {
        match &self.image {
            ImageSlot::Present(image) => (image.height + metrics.image_padding).max(metrics.min_image_block),
            ImageSlot::Absent => metrics.text_block,
        }
    }

    /// How far the block reaches above its title baseline
    pub fn lead(&self, metrics: &LayoutMetrics) -> Pt {
        if self.image.is_present() {
            metrics.image_lead
        } else {
            Pt(0.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Header(HeaderBlock),
    Product(ProductBlock),
}

/// Collapse runs of whitespace (including line breaks) into single spaces,
/// since descriptions are drawn on one line
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the block sequence for a catalog: its header first, then one block per
/// product in catalog order. `images` holds each product's image, by position.
pub fn catalog_blocks(
    catalog: &Catalog,
    labels: &Labels,
    logo: ImageSlot<EmbeddedImage>,
    images: Vec<ImageSlot<EmbeddedImage>>,
) -> Vec<ContentBlock> {
    let header = HeaderBlock {
        title: catalog.name.clone(),
        caption: labels.caption(catalog.products.len()),
        logo,
    };

    let mut images = images.into_iter();
    let products = catalog.products.iter().enumerate().map(|(index, product)| {
        ContentBlock::Product(ProductBlock {
            title: labels.title(index + 1, &product.name),
            price: labels.price(&product.display_price()),
            description: product.visible_description().map(single_line),
            image: images.next().unwrap_or_default(),
        })
    });

    std::iter::once(ContentBlock::Header(header))
        .chain(products)
        .collect()
}
